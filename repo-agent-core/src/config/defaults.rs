//! Built-in defaults written by `init` and used when files are missing

pub const WATCH_EXTENSIONS: &[&str] = &[".py", ".js", ".ts", ".java", ".go"];

pub const IGNORE_PATTERNS: &[&str] = &[
    "node_modules/",
    ".git/",
    "__pycache__/",
    ".agent/",
    "*.pyc",
    ".env",
    "*.log",
];

pub const STANDARDS_TEMPLATE: &str = r#"# Company Coding Standards

## Naming Conventions
- Use camelCase for variables and functions
- Use PascalCase for classes
- Use UPPER_SNAKE_CASE for constants

## Best Practices
- Add error handling for all async operations
- Write docstrings for public functions
- Keep functions under 50 lines; call out any exception in the report

## Security
- Never hardcode secrets or API keys
- Sanitize all user input
- Use parameterized queries for databases
"#;

pub const PURPOSE_TEMPLATE: &str = r#"# Repository Purpose

## Mission
[What is this project? One paragraph describing core intent]

## Direction
[Where is this project heading? List current and planned phases]

## Deviation Signals
[What changes would indicate scope creep or wrong direction?]
"#;
