pub mod extract;
pub mod prompt;

pub use extract::{
    extract_json, parse_technology_report, parse_tool_selection, parse_vulnerability_report,
    ExtractError,
};
pub use prompt::{
    build_technology_prompt, build_tool_selection_prompt, build_vulnerability_prompt,
    short_code_technology_report, ANALYST_PREAMBLE, AVAILABLE_TOOLS, MIN_TECHNOLOGY_CODE_LEN,
};
