//! Instruction text for the two calls.

/// Sent alongside the PNG of the drawing.
pub const RECOGNIZE_PROMPT: &str = "Recognize this handwritten math expression and write it in LaTeX. \
Reply with the expression only, without surrounding text, code fences or math delimiters.";

/// Solve request for `expression`.
///
/// The reply is asked to be bare JSON, but callers must still tolerate
/// fences and surrounding prose.
#[must_use]
pub fn solve_prompt(expression: &str) -> String {
    format!(
        r#"Solve the following math expression step by step: {expression}

Explain the solution in detail using this JSON format:

{{
  "steps": [
    {{
      "step": <step number>,
      "description": "<what this step does>",
      "equation": "<LaTeX for the result of this step>",
      "supplement": "<optional longer explanation of the reasoning>"
    }}
  ],
  "finalAnswer": "<LaTeX or a short plain-language conclusion>",
  "graphData": {{
    "isPlottable": true,
    "type": "line",
    "labels": ["-2", "-1", "0", "1", "2"],
    "datasets": [
      {{
        "label": "<function, e.g. y = x^2>",
        "data": [4, 1, 0, 1, 4],
        "borderColor": "rgb(75, 192, 192)",
        "backgroundColor": "rgba(75, 192, 192, 0.2)"
      }}
    ]
  }}
}}

Rules:
- Escape every backslash as \\ so the JSON stays valid.
- Omit "supplement" when a step needs no extra explanation.
- Include "graphData" only when the expression is a function of a single variable; otherwise omit it or set "isPlottable" to false.
- "labels" are the x values and each dataset's "data" holds the matching y values as numbers.
- Return pure JSON only, with no text before or after it.
"#
    )
}
