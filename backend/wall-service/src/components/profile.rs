use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileField {
    pub label: &'static str,
    pub value: &'static str,
}

/// Profile sidebar: a single fixed identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: &'static str,
    pub avatar_url: &'static str,
    pub section_title: &'static str,
    pub fields: Vec<ProfileField>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "James",
            avatar_url: "/profile-image.jpg",
            section_title: "Information",
            fields: vec![
                ProfileField {
                    label: "Networks",
                    value: "Developer",
                },
                ProfileField {
                    label: "Current City",
                    value: "Palos Verdes Estates, CA",
                },
            ],
        }
    }
}
