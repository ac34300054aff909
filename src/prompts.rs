pub const HELPER_SYSTEM: &str = include_str!("../data/prompts/helper_system.txt");
pub const HELPER_USER: &str = include_str!("../data/prompts/helper_user.txt");
pub const SCREENSHOT: &str = include_str!("../data/prompts/screenshot.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template, so values that themselves
/// contain `{{...}}` are inserted verbatim. Unknown placeholders are left as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };

        let key = &after[..end];
        match vars.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => result.push_str(value),
            None => {
                result.push_str("{{");
                result.push_str(key);
                result.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    result.push_str(rest);
    result
}
