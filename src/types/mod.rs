pub mod response;
pub mod resume;

pub use resume::{
    new_id, Credential, CredentialKind, DocumentStats, Experience, ExperienceKind, Profile,
    ProfileLink, Project, ResumeDocument, SkillGroup, SkillItem,
};
