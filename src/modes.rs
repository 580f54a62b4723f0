//! Conversation personas and their route keys.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModeKey {
    Religious,
    Wellness,
    Information,
    Shopping,
}

impl ModeKey {
    pub fn as_str(self) -> &'static str {
        match self {
            ModeKey::Religious => "religious",
            ModeKey::Wellness => "wellness",
            ModeKey::Information => "information",
            ModeKey::Shopping => "shopping",
        }
    }

    pub fn parse(param: &str) -> Option<Self> {
        MODES
            .iter()
            .map(|mode| mode.key)
            .find(|key| key.as_str() == param)
    }
}

#[derive(Debug, PartialEq)]
pub struct Mode {
    pub key: ModeKey,
    pub name: &'static str,
    pub description: &'static str,
    pub accent_color: &'static str,
    pub system_prompt: &'static str,
}

pub static MODES: [Mode; 4] = [
    Mode {
        key: ModeKey::Religious,
        name: "Religious Companion",
        description: "Engage in religious discussions, learn spiritual teachings, and find comfort in faith.",
        accent_color: "#8B5CF6",
        system_prompt: "You are a religious companion for elderly users. Respond with compassion, wisdom, and respect for all beliefs. Focus on providing religious teachings, stories, and spiritual guidance when asked. Avoid political commentary and respect the user's faith tradition. Keep responses concise and easy to understand for senior citizens.",
    },
    Mode {
        key: ModeKey::Wellness,
        name: "Wellness Guide",
        description: "Get guidance on health, exercise, diet, and general wellbeing tailored for seniors.",
        accent_color: "#34D399",
        system_prompt: "You are a wellness guide for elderly users. Provide gentle, practical health advice, focusing on exercises suitable for seniors, nutrition guidance, and mental wellbeing tips. Never give specific medical diagnoses or replace professional medical advice. Keep responses concise and easy to understand for senior citizens.",
    },
    Mode {
        key: ModeKey::Information,
        name: "Information Assistant",
        description: "Find answers to your questions about government schemes, local resources, and more.",
        accent_color: "#3B82F6",
        system_prompt: "You are an information assistant for elderly users. Provide clear, factual, and helpful information about government schemes, local resources, technology usage, and general knowledge. Avoid complex jargon and explain concepts in simple terms. Keep responses concise and easy to understand for senior citizens.",
    },
    Mode {
        key: ModeKey::Shopping,
        name: "Shopping Helper",
        description: "Get assistance with ordering food, groceries, or other items from online services.",
        accent_color: "#F97316",
        system_prompt: "You are a shopping assistant for elderly users. Help them navigate online shopping platforms, place orders for food, groceries, and other essentials. When the user wants to place an order, ask for their location or address. Keep responses concise and easy to understand for senior citizens.",
    },
];

pub fn mode(key: ModeKey) -> &'static Mode {
    match key {
        ModeKey::Religious => &MODES[0],
        ModeKey::Wellness => &MODES[1],
        ModeKey::Information => &MODES[2],
        ModeKey::Shopping => &MODES[3],
    }
}

/// Resolves a route parameter, defaulting to the information assistant.
pub fn resolve_mode(param: Option<&str>) -> &'static Mode {
    let key = param
        .map(str::trim)
        .and_then(ModeKey::parse)
        .unwrap_or(ModeKey::Information);
    mode(key)
}

const ORDER_KEYWORDS: &[&str] = &["order", "buy", "purchase"];

/// Coarse order-intent heuristic used by the shopping helper.
pub fn has_order_intent(text: &str) -> bool {
    let lowered = text.to_lowercase();
    ORDER_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}
