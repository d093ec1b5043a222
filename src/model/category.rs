use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SkillCategory {
    Good,
    Average,
    Bad,
}

impl SkillCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Good => "Good",
            SkillCategory::Average => "Average",
            SkillCategory::Bad => "Bad",
        }
    }
}

pub fn category_order() -> &'static [SkillCategory] {
    &[
        SkillCategory::Good,
        SkillCategory::Average,
        SkillCategory::Bad,
    ]
}
