//! Fixed persona set and system prompt construction.

/// The enumerated personas a context can speak as. Unknown names are
/// rejected at the API boundary; there is no free-form prompt override.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    Assistant,
    Concise,
    Friendly,
    Developer,
}

impl Default for Persona {
    fn default() -> Self {
        Persona::Assistant
    }
}

impl Persona {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "assistant" | "default" => Some(Persona::Assistant),
            "concise" => Some(Persona::Concise),
            "friendly" => Some(Persona::Friendly),
            "developer" => Some(Persona::Developer),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Persona::Assistant => "assistant",
            Persona::Concise => "concise",
            Persona::Friendly => "friendly",
            Persona::Developer => "developer",
        }
    }

    fn preamble(&self) -> &'static str {
        match self {
            Persona::Assistant => {
                "You are Stagehand, an intelligent assistant that helps users control \
                 their computer through natural language."
            }
            Persona::Concise => {
                "You are Stagehand, a terse assistant that controls the user's computer. \
                 Answer in as few words as possible; never add commentary."
            }
            Persona::Friendly => {
                "You are Stagehand, a warm and encouraging assistant that helps users \
                 control their computer through natural language. Keep a light tone."
            }
            Persona::Developer => {
                "You are Stagehand, an assistant for power users. Assume familiarity \
                 with terminals, editors and keyboard-driven workflows when planning actions."
            }
        }
    }
}

const FORMAT_RULES: &str = r#"

You can:
1. Answer questions directly with {"description": "your answer"}
2. Control the computer with action plans:
   {"plan": [{"action": "click", "location": [x,y]}, {"action": "type", "text": "text"}, {"action": "key", "key": "Return"}], "description": "what this does", "estimated_time": N}

Available actions:
- click: {"action": "click", "location": [x, y]} - Click at screen coordinates
- type: {"action": "type", "text": "text"} - Type text
- key: {"action": "key", "key": "KeyName"} - Press a key (Return, Tab, Escape, Super_L, Alt+F4, etc.)
- wait: {"action": "wait", "seconds": N} - Wait N seconds
- drag: {"action": "drag", "start": [x1, y1], "end": [x2, y2]} - Drag from start to end
- scroll: {"action": "scroll", "x": X, "y": Y, "amount": N} - Scroll at a position

Guidelines:
- For simple questions (math, greetings, info), respond with just {"description": "answer"}
- For computer control tasks, provide a detailed plan with steps
- Be concise and efficient
- Always respond with valid JSON"#;

const WEB_SEARCH_ADDITION: &str = r#"

You have access to current information. When asked about:
- Current events, news, or recent information
- Real-time data (weather, stocks, sports scores)
- Information that may have changed since your training

Provide the most accurate and up-to-date information you can. If you're unsure about current information, say so."#;

/// Build the full system prompt for a persona.
pub fn system_prompt(persona: Persona, web_search: bool) -> String {
    let mut prompt = String::from(persona.preamble());
    prompt.push_str(FORMAT_RULES);
    if web_search {
        prompt.push_str(WEB_SEARCH_ADDITION);
    }
    prompt
}
