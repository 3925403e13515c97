// A single CSS property: "color: red"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub value: String,
}

// input: "color: red; --background:#1A1A1B;"
// output: vec![Declaration { name: "color", value: "red" }, Declaration { name: "--background", value: "#1A1A1B" }]
pub fn parse_declarations(input: &str) -> Vec<Declaration> {
    input
        .split(';')
        .filter_map(|pair| {
            let (n, v) = pair.split_once(':')?;
            let name = n.trim().to_ascii_lowercase();
            if name.is_empty() {
                return None;
            }
            let value = v.trim().to_string();
            Some(Declaration { name, value })
        })
        .collect()
}

/// Value of the custom property `--name`, e.g. `custom_property(decls, "background")`.
pub fn custom_property<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a str> {
    declarations
        .iter()
        .find(|d| d.name.strip_prefix("--") == Some(name))
        .map(|d| d.value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_custom_properties_without_spaces() {
        let decls = parse_declarations("--background:#1A1A1B;--bodyText:#D7DADC;color: red");
        assert_eq!(decls.len(), 3);
        assert_eq!(custom_property(&decls, "background"), Some("#1A1A1B"));
        assert_eq!(custom_property(&decls, "bodytext"), Some("#D7DADC"));
        assert_eq!(custom_property(&decls, "color"), None);
    }

    #[test]
    fn skips_garbage_segments() {
        let decls = parse_declarations(";;: nothing; novalue;");
        assert!(decls.is_empty());
    }
}
