use crate::orchestrator::TrinityRequest;
use std::fmt;

/// Thought Experiment Generator.
pub const GENERATE_TEMPLATE: &str = "Topic: {topic}\nGoal: {goal}\nConstraints: {constraints}\nGenerate 5 approaches.";

/// Oppositional Method Mapper.
pub const OPPOSE_TEMPLATE: &str = "Oppose the following:\n{generated}\nList tensions, risks, and the top 2 approaches.";

/// Result Fusion Synthesizer.
pub const SYNTHESIZE_TEMPLATE: &str = "Fuse these perspectives:\n{opposed}\nReturn a final plan, rationale, metrics, and risks.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Generate,
    Oppose,
    Synthesize,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Generate, Stage::Oppose, Stage::Synthesize];

    pub fn name(self) -> &'static str {
        match self {
            Stage::Generate => "generate",
            Stage::Oppose => "oppose",
            Stage::Synthesize => "synthesize",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Stage::Generate => "Generate",
            Stage::Oppose => "Oppose",
            Stage::Synthesize => "Synthesize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Single-pass substitution so placeholder-looking text inside user input stays verbatim.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + vars.iter().map(|(_, v)| v.len()).sum::<usize>());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v, close))
        });

        match value {
            Some((v, close)) => {
                out.push_str(v);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn generate_prompt(request: &TrinityRequest) -> String {
    fill(
        GENERATE_TEMPLATE,
        &[
            ("topic", request.topic.as_str()),
            ("goal", request.goal.as_str()),
            ("constraints", request.constraints.as_str()),
        ],
    )
}

pub fn oppose_prompt(generated: &str) -> String {
    fill(OPPOSE_TEMPLATE, &[("generated", generated)])
}

pub fn synthesize_prompt(opposed: &str) -> String {
    fill(SYNTHESIZE_TEMPLATE, &[("opposed", opposed)])
}
