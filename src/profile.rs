//! The single candidate whose answers fill every form.
//!
//! Loaded once from the `[profile]` table of the configuration and handed
//! to the classifier by value; nothing mutates it afterwards.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity, contact data, résumé and history of the candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_resume_path")]
    pub resume_path: PathBuf,
    /// Answer for salary-expectation fields.
    #[serde(default = "default_salary")]
    pub salary: String,
    #[serde(default)]
    pub years: YearsOfExperience,
    #[serde(default)]
    pub work_history: Vec<WorkEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    /// Skills grouped by category, e.g. `languages = ["Rust", "SQL"]`.
    #[serde(default)]
    pub skills: BTreeMap<String, Vec<String>>,
}

/// Years-of-experience answers by field topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YearsOfExperience {
    /// Software, development or programming questions.
    #[serde(default = "default_software_years")]
    pub software: u32,
    /// Data, analytics, ML or AI questions.
    #[serde(default = "default_data_years")]
    pub data: u32,
    #[serde(default = "default_other_years")]
    pub other: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkEntry {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EducationEntry {
    pub degree: String,
    pub school: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    #[serde(default)]
    pub gpa: String,
    #[serde(default)]
    pub location: String,
}

fn default_country() -> String {
    "United States".to_string()
}

fn default_resume_path() -> PathBuf {
    PathBuf::from("resume/resume.pdf")
}

fn default_salary() -> String {
    "80000".to_string()
}

fn default_software_years() -> u32 {
    5
}

fn default_data_years() -> u32 {
    3
}

fn default_other_years() -> u32 {
    3
}

impl Default for YearsOfExperience {
    fn default() -> Self {
        Self {
            software: default_software_years(),
            data: default_data_years(),
            other: default_other_years(),
        }
    }
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            phone: String::new(),
            city: String::new(),
            country: default_country(),
            resume_path: default_resume_path(),
            salary: default_salary(),
            years: YearsOfExperience::default(),
            work_history: Vec::new(),
            education: Vec::new(),
            skills: BTreeMap::new(),
        }
    }
}

impl CandidateProfile {
    /// Most recent education entry, if any.
    pub fn latest_education(&self) -> Option<&EducationEntry> {
        self.education.first()
    }

    /// Current or most recent position, if any.
    pub fn latest_job(&self) -> Option<&WorkEntry> {
        self.work_history.first()
    }

    /// All skills across categories, comma separated, in category order.
    pub fn skills_line(&self) -> String {
        self.skills
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fields a form is likely to require that are missing from the profile.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.phone.trim().is_empty() {
            missing.push("phone");
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            missing.push("name");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_fixed_answers() {
        let profile = CandidateProfile::default();
        assert_eq!(profile.country, "United States");
        assert_eq!(profile.salary, "80000");
        assert_eq!(profile.years.software, 5);
        assert_eq!(profile.years.data, 3);
        assert_eq!(profile.missing_fields(), vec!["email", "phone", "name"]);
    }

    #[test]
    fn deserialize_profile_table() {
        let toml_str = r#"
            first_name = "Ada"
            last_name = "Lovelace"
            email = "ada@example.com"
            phone = "5550100"

            [years]
            software = 7

            [skills]
            languages = ["Rust", "SQL"]
            ml = ["PyTorch"]

            [[education]]
            degree = "MS Computer Science"
            school = "University of Massachusetts"
            gpa = "3.7"
        "#;
        let profile: CandidateProfile = toml::from_str(toml_str).unwrap();
        assert_eq!(profile.years.software, 7);
        assert_eq!(profile.years.data, 3);
        assert_eq!(profile.skills_line(), "Rust, SQL, PyTorch");
        assert_eq!(profile.latest_education().unwrap().gpa, "3.7");
        assert!(profile.missing_fields().is_empty());
    }
}
