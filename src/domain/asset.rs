// Asset domain model
use serde::Serialize;

const FALLBACK_COLOR: &str = "#FFFFFF";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub color: String,
}

impl Asset {
    pub fn new(id: String, color: Option<String>) -> Self {
        let name = Self::format_name(&id);
        Self {
            id,
            name,
            color: color.unwrap_or_else(|| FALLBACK_COLOR.to_string()),
        }
    }

    fn format_name(id: &str) -> String {
        // Convert "usd-coin" to "Usd Coin"
        id.split('-')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
