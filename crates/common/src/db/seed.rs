//! Sample projects inserted into an empty table

use crate::db::models::NewProject;

pub fn sample_projects() -> Vec<NewProject> {
    vec![
        NewProject {
            title: "Joben".to_string(),
            description: "A job board dedicated to white-collar roles, offering sourcing and online job promotion.".to_string(),
            image: String::new(),
            tech: vec!["WordPress", "PHP", "MySQL", "Custom APIs"]
                .into_iter()
                .map(String::from)
                .collect(),
            github: Some(String::new()),
            demo: Some("https://joben.eu".to_string()),
            featured: true,
        },
        NewProject {
            title: "DiveIn".to_string(),
            description: "A project focused on professional development of a local community.".to_string(),
            image: String::new(),
            tech: vec!["React", "Node.js", "Python", "OpenAI API"]
                .into_iter()
                .map(String::from)
                .collect(),
            github: Some(String::new()),
            demo: Some("https://divein.ro".to_string()),
            featured: true,
        },
        NewProject {
            title: "EDA Dent".to_string(),
            description: "Integrating AI into SEO strategies for dental clinics.".to_string(),
            image: String::new(),
            tech: vec!["Python", "NLP", "SEO Automation Tools"]
                .into_iter()
                .map(String::from)
                .collect(),
            github: Some(String::new()),
            demo: Some("https://edadent.ro".to_string()),
            featured: true,
        },
    ]
}
