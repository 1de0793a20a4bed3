// src/types/resume.rs
//! Resume document: the single aggregate behind both the public page and the admin surface

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Opaque identifier for list entries
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// `null` lists load as empty, same as missing ones
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ===== Document =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResumeDocument {
    pub profile: Profile,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<SkillGroup>,
    #[serde(deserialize_with = "null_as_default")]
    pub experience: Vec<Experience>,
    /// Legacy unified list, emptied by [`ResumeDocument::migrate`]
    #[serde(deserialize_with = "null_as_default")]
    pub achievements: Vec<LegacyAchievement>,
    #[serde(deserialize_with = "null_as_default")]
    pub courses: Vec<Credential>,
    #[serde(deserialize_with = "null_as_default")]
    pub certificates: Vec<Credential>,
    #[serde(deserialize_with = "null_as_default")]
    pub awards: Vec<Credential>,
    #[serde(deserialize_with = "null_as_default")]
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    pub title: String,
    pub hero_description: String,
    pub about_description: String,
    pub location: String,
    pub email: String,
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Vec<ProfileLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_base64: Option<String>,
    // Legacy field names, moved into hero/about descriptions on load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intro: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_section1: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileLink {
    pub label: String,
    pub href: String,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillGroup {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<SkillItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillItem {
    pub name: String,
    /// Free-form proficiency label
    pub level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ExperienceKind,
    pub company: String,
    pub role: String,
    pub period: String,
    pub summary: String,
}

/// Timeline an experience entry belongs to. Unrecognised labels survive a load/save cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExperienceKind {
    #[default]
    Work,
    Education,
    Other(String),
}

impl From<String> for ExperienceKind {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "work" => Self::Work,
            "education" => Self::Education,
            _ => Self::Other(value),
        }
    }
}

impl From<ExperienceKind> for String {
    fn from(kind: ExperienceKind) -> Self {
        match kind {
            ExperienceKind::Work => "Work".to_string(),
            ExperienceKind::Education => "Education".to_string(),
            ExperienceKind::Other(label) => label,
        }
    }
}

/// Shared shape of courses, certificates and awards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Credential {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub year: String,
    pub link: String,
    pub desc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_base64: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyAchievement {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(flatten)]
    pub entry: Credential,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Technology tags separated by `/`
    pub tech: String,
    pub link: String,
    pub desc: String,
}

impl Project {
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tech.split('/').map(str::trim).filter(|t| !t.is_empty())
    }
}

// ===== Credential collections =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Course,
    Certificate,
    Award,
}

impl CredentialKind {
    pub const ALL: [CredentialKind; 3] = [Self::Course, Self::Certificate, Self::Award];

    /// Keyword match on a legacy achievement `type`; anything unrecognised counts as a course
    pub fn classify(legacy_type: &str) -> Self {
        let t = legacy_type.to_lowercase();
        if t.contains("課程") || t.contains("course") {
            Self::Course
        } else if t.contains("證照") || t.contains("cert") {
            Self::Certificate
        } else if t.contains("獎") || t.contains("award") {
            Self::Award
        } else {
            Self::Course
        }
    }

    /// Badge shown on rendered cards
    pub fn badge(&self) -> &'static str {
        match self {
            Self::Course => "Course",
            Self::Certificate => "Certificate",
            Self::Award => "Award",
        }
    }

    /// DOM id of the grid this collection renders into
    pub fn grid_id(&self) -> &'static str {
        match self {
            Self::Course => "courses-grid",
            Self::Certificate => "certificates-grid",
            Self::Award => "awards-grid",
        }
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Course => "courses",
            Self::Certificate => "certificates",
            Self::Award => "awards",
        };
        f.write_str(name)
    }
}

impl FromStr for CredentialKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "course" | "courses" => Ok(Self::Course),
            "cert" | "certificate" | "certificates" => Ok(Self::Certificate),
            "award" | "awards" => Ok(Self::Award),
            other => anyhow::bail!("Unknown credential collection: {}", other),
        }
    }
}

/// Aggregate counters shown on the admin dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    pub experience: usize,
    pub achievements: usize,
    pub projects: usize,
}

impl ResumeDocument {
    /// Parse a serialized document and bring it to the current shape.
    /// The flag reports whether migrations changed anything.
    pub fn from_json(raw: &str) -> Result<(Self, bool)> {
        let mut doc: Self = serde_json::from_str(raw).context("Failed to parse resume document")?;
        let changed = doc.migrate();
        Ok((doc, changed))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize resume document")
    }

    pub fn credentials(&self, kind: CredentialKind) -> &Vec<Credential> {
        match kind {
            CredentialKind::Course => &self.courses,
            CredentialKind::Certificate => &self.certificates,
            CredentialKind::Award => &self.awards,
        }
    }

    pub fn credentials_mut(&mut self, kind: CredentialKind) -> &mut Vec<Credential> {
        match kind {
            CredentialKind::Course => &mut self.courses,
            CredentialKind::Certificate => &mut self.certificates,
            CredentialKind::Award => &mut self.awards,
        }
    }

    pub fn stats(&self) -> DocumentStats {
        DocumentStats {
            experience: self.experience.len(),
            achievements: self.courses.len() + self.certificates.len() + self.awards.len(),
            projects: self.projects.len(),
        }
    }

    pub fn experience_of(&self, kind: &ExperienceKind) -> impl Iterator<Item = &Experience> {
        let kind = kind.clone();
        self.experience.iter().filter(move |e| e.kind == kind)
    }

    /// Run every load-time migration, returning whether the document changed
    pub fn migrate(&mut self) -> bool {
        let mut changed = self.migrate_achievements();
        changed |= self.profile.migrate_legacy_fields();
        changed |= self.assign_missing_ids();
        changed
    }

    fn migrate_achievements(&mut self) -> bool {
        if self.achievements.is_empty() {
            return false;
        }

        for legacy in std::mem::take(&mut self.achievements) {
            let mut entry = legacy.entry;
            if entry.id.is_empty() {
                entry.id = new_id();
            }
            self.credentials_mut(CredentialKind::classify(&legacy.kind))
                .push(entry);
        }
        true
    }

    fn assign_missing_ids(&mut self) -> bool {
        let mut changed = false;
        let mut fill = |id: &mut String| {
            if id.trim().is_empty() {
                *id = new_id();
                changed = true;
            }
        };

        self.skills.iter_mut().for_each(|s| fill(&mut s.id));
        self.experience.iter_mut().for_each(|e| fill(&mut e.id));
        self.courses.iter_mut().for_each(|c| fill(&mut c.id));
        self.certificates.iter_mut().for_each(|c| fill(&mut c.id));
        self.awards.iter_mut().for_each(|c| fill(&mut c.id));
        self.projects.iter_mut().for_each(|p| fill(&mut p.id));
        changed
    }

    /// First-run content
    pub fn seed() -> Self {
        let skill = |name: &str, items: &[(&str, &str)]| SkillGroup {
            id: new_id(),
            name: name.to_string(),
            items: items
                .iter()
                .map(|(name, level)| SkillItem {
                    name: name.to_string(),
                    level: level.to_string(),
                })
                .collect(),
        };
        let experience = |kind: ExperienceKind, company: &str, role: &str, period: &str, summary: &str| Experience {
            id: new_id(),
            kind,
            company: company.to_string(),
            role: role.to_string(),
            period: period.to_string(),
            summary: summary.to_string(),
        };

        Self {
            profile: Profile {
                name: "Your Name".to_string(),
                title: "Data Analyst".to_string(),
                hero_description: "Statistics graduate working across Python, SAS and R, with hands-on experience collaborating on Angular frontends and Spring Boot services.".to_string(),
                about_description: String::new(),
                location: "Taiwan".to_string(),
                email: "contact@example.com".to_string(),
                phone: "+886-900-000-000".to_string(),
                links: vec![
                    ProfileLink {
                        label: "GitHub".to_string(),
                        href: "https://github.com/".to_string(),
                        icon: "fa-brands fa-github".to_string(),
                    },
                    ProfileLink {
                        label: "LinkedIn".to_string(),
                        href: "https://www.linkedin.com".to_string(),
                        icon: "fa-brands fa-linkedin".to_string(),
                    },
                ],
                ..Profile::default()
            },
            skills: vec![
                skill(
                    "Data analysis",
                    &[
                        ("Python (Pandas/NumPy)", "Proficient"),
                        ("SAS", "Novice"),
                        ("R", "Beginner"),
                        ("Statistical modelling", "Advanced"),
                    ],
                ),
                skill(
                    "Frontend collaboration",
                    &[("Angular", "Beginner"), ("RWD / CSS3", "Advanced")],
                ),
                skill(
                    "Backend collaboration",
                    &[("Spring Boot", "Beginner"), ("RESTful API", "Beginner")],
                ),
            ],
            experience: vec![
                experience(
                    ExperienceKind::Work,
                    "Example Analytics Co.",
                    "Data Analyst",
                    "3 years",
                    "Reporting, data modelling and cross-team system integration.",
                ),
                experience(
                    ExperienceKind::Work,
                    "University Research Lab",
                    "Research Assistant",
                    "4 years",
                    "Research data processing, modelling and analysis.",
                ),
                experience(
                    ExperienceKind::Education,
                    "Graduate Institute of Statistics",
                    "M.Sc.",
                    "Highest degree",
                    "Statistical theory, applications and data analysis methods.",
                ),
            ],
            ..Self::default()
        }
    }
}

impl Profile {
    fn migrate_legacy_fields(&mut self) -> bool {
        let mut changed = false;

        if let Some(intro) = self.intro.take() {
            if self.hero_description.is_empty() {
                self.hero_description = intro;
            }
            changed = true;
        }

        if let Some(about) = self.about_section1.take() {
            if self.about_description.is_empty() {
                self.about_description = about;
            }
            changed = true;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy(kind: &str, name: &str) -> serde_json::Value {
        serde_json::json!({ "type": kind, "name": name, "issuer": "Org", "year": "2020", "link": "", "desc": "" })
    }

    #[test]
    fn test_achievements_partitioned_by_keyword() {
        let raw = serde_json::json!({
            "profile": { "name": "Tester" },
            "achievements": [
                legacy("線上課程", "course-a"),
                legacy("專業證照", "cert-a"),
                legacy("Award", "award-a"),
                legacy("something else", "misc-a"),
            ]
        })
        .to_string();

        let (doc, changed) = ResumeDocument::from_json(&raw).unwrap();

        assert!(changed);
        assert!(doc.achievements.is_empty());
        let names = |list: &Vec<Credential>| list.iter().map(|c| c.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&doc.courses), vec!["course-a", "misc-a"]);
        assert_eq!(names(&doc.certificates), vec!["cert-a"]);
        assert_eq!(names(&doc.awards), vec!["award-a"]);
        assert!(doc.courses.iter().all(|c| !c.id.is_empty()));
    }

    #[test]
    fn test_missing_and_null_lists_default_to_empty() {
        let raw = r#"{"profile":{"name":"A"},"skills":null,"projects":null}"#;
        let (doc, changed) = ResumeDocument::from_json(raw).unwrap();

        assert!(!changed);
        assert!(doc.skills.is_empty());
        assert!(doc.projects.is_empty());
        assert!(doc.courses.is_empty());
    }

    #[test]
    fn test_legacy_profile_fields_move() {
        let raw = r#"{"profile":{"name":"A","intro":"hello","aboutSection1":"about me"}}"#;
        let (doc, changed) = ResumeDocument::from_json(raw).unwrap();

        assert!(changed);
        assert_eq!(doc.profile.hero_description, "hello");
        assert_eq!(doc.profile.about_description, "about me");
        let reserialized = doc.to_json().unwrap();
        assert!(!reserialized.contains("intro"));
        assert!(!reserialized.contains("aboutSection1"));
    }

    #[test]
    fn test_skills_without_id_get_one() {
        let raw = r#"{"skills":[{"name":"Rust","items":[{"name":"tokio","level":"Advanced"}]}]}"#;
        let (doc, changed) = ResumeDocument::from_json(raw).unwrap();

        assert!(changed);
        assert!(!doc.skills[0].id.is_empty());
    }

    #[test]
    fn test_unknown_experience_kind_survives() {
        let raw = r#"{"experience":[{"id":"x","type":"Volunteer","company":"C"}]}"#;
        let (doc, _) = ResumeDocument::from_json(raw).unwrap();

        assert_eq!(doc.experience[0].kind, ExperienceKind::Other("Volunteer".to_string()));
        assert!(doc.to_json().unwrap().contains(r#""type":"Volunteer""#));
    }

    #[test]
    fn test_experience_kind_is_case_insensitive() {
        let raw = r#"{"experience":[{"id":"x","type":"education"}]}"#;
        let (doc, _) = ResumeDocument::from_json(raw).unwrap();
        assert_eq!(doc.experience[0].kind, ExperienceKind::Education);
    }

    #[test]
    fn test_seed_is_already_migrated() {
        let mut seed = ResumeDocument::seed();
        assert!(!seed.migrate());
        assert_eq!(seed.stats().experience, 3);
    }

    #[test]
    fn test_project_tags() {
        let project = Project {
            tech: "Rust / tokio/ /rocket".to_string(),
            ..Project::default()
        };
        assert_eq!(project.tags().collect::<Vec<_>>(), vec!["Rust", "tokio", "rocket"]);
    }

    #[test]
    fn test_credential_kind_parsing() {
        assert_eq!("Awards".parse::<CredentialKind>().unwrap(), CredentialKind::Award);
        assert_eq!("cert".parse::<CredentialKind>().unwrap(), CredentialKind::Certificate);
        assert!("badges".parse::<CredentialKind>().is_err());
    }
}
