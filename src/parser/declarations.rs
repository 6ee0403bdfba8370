//! Declaration scan
//!
//! Finds `<type> <name>` declarations in a token stream. Good enough for
//! hover/definition/signature lookups inside one document; not a parser.

use super::lexer::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq)]
pub enum DeclarationKind {
    Function { parameters: Vec<String> },
    Variable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub name: String,
    pub type_name: String,
    pub kind: DeclarationKind,
    /// The name token
    pub token: Token,
    /// Comment directly above the declaration, delimiters stripped
    pub comment: Option<String>,
}

impl Declaration {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, DeclarationKind::Function { .. })
    }

    /// Human readable signature, e.g. `int Add(int a, int b)`
    pub fn signature(&self) -> String {
        match &self.kind {
            DeclarationKind::Function { parameters } => {
                format!("{} {}({})", self.type_name, self.name, parameters.join(", "))
            }
            DeclarationKind::Variable => format!("{} {}", self.type_name, self.name),
        }
    }
}

/// Scan a token stream for declarations, in source order
pub fn find_declarations(tokens: &[Token]) -> Vec<Declaration> {
    let significant: Vec<(usize, &Token)> = tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.kind != TokenKind::Comment)
        .collect();

    let mut declarations = Vec::new();
    let mut i = 0;

    while i + 1 < significant.len() {
        let (type_idx, type_token) = significant[i];
        let (_, name_token) = significant[i + 1];

        if type_token.kind != TokenKind::Type || name_token.kind != TokenKind::Identifier {
            i += 1;
            continue;
        }

        let is_call = significant
            .get(i + 2)
            .is_some_and(|(_, t)| t.is_punct("("));

        let kind = if is_call {
            DeclarationKind::Function {
                parameters: collect_parameters(&significant, i + 2),
            }
        } else {
            DeclarationKind::Variable
        };

        // Doc comment sits above the type or above a leading `const`
        let first_idx = match i.checked_sub(1).map(|p| significant[p]) {
            Some((idx, t)) if t.kind == TokenKind::Keyword && t.text == "const" => idx,
            _ => type_idx,
        };

        declarations.push(Declaration {
            name: name_token.text.clone(),
            type_name: type_token.text.clone(),
            kind,
            token: name_token.clone(),
            comment: leading_comment(tokens, first_idx),
        });

        // Keep scanning inside parameter lists so parameters are found too
        i += 2;
    }

    declarations
}

/// Find the first declaration named `name`
pub fn find_declaration<'a>(declarations: &'a [Declaration], name: &str) -> Option<&'a Declaration> {
    declarations.iter().find(|d| d.name == name)
}

/// Collect comma separated parameters starting at the `(` at `open`
fn collect_parameters(significant: &[(usize, &Token)], open: usize) -> Vec<String> {
    let mut parameters = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut depth = 0usize;

    for (_, token) in &significant[open..] {
        if token.is_punct("(") {
            depth += 1;
            if depth == 1 {
                continue;
            }
        } else if token.is_punct(")") {
            depth -= 1;
            if depth == 0 {
                push_parameter(&mut parameters, &mut current);
                return parameters;
            }
        } else if token.is_punct(",") && depth == 1 {
            push_parameter(&mut parameters, &mut current);
            continue;
        } else if token.is_punct("{") || token.is_punct(";") {
            // Unclosed list: stop at the next statement boundary
            push_parameter(&mut parameters, &mut current);
            return parameters;
        }
        current.push(&token.text);
    }

    push_parameter(&mut parameters, &mut current);
    parameters
}

fn push_parameter(parameters: &mut Vec<String>, current: &mut Vec<&str>) {
    if !current.is_empty() && *current != ["void"] {
        parameters.push(current.join(" "));
    }
    current.clear();
}

fn leading_comment(tokens: &[Token], index: usize) -> Option<String> {
    let previous = tokens.get(index.checked_sub(1)?)?;
    let first = tokens.get(index)?;

    if previous.kind != TokenKind::Comment || previous.end.line + 1 < first.start.line {
        return None;
    }

    let text = previous.text.as_str();
    let body = text
        .strip_prefix("//")
        .or_else(|| text.strip_prefix("/*").and_then(|t| t.strip_suffix("*/")))
        .unwrap_or(text);
    Some(body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{Grammar, Lexer};

    fn scan(text: &str) -> Vec<Declaration> {
        let lexer = Lexer::new(&Grammar::embedded().expect("embedded grammar"));
        find_declarations(&lexer.tokenize_text(text))
    }

    #[test]
    fn test_function_with_parameters() {
        let decls = scan("// Adds two numbers\nint Add(int a, int b = 2) { return a + b; }");

        assert_eq!(decls.len(), 3);
        let add = &decls[0];
        assert_eq!(add.name, "Add");
        assert_eq!(add.signature(), "int Add(int a, int b = 2)");
        assert_eq!(add.comment.as_deref(), Some("Adds two numbers"));
        // Parameters are declarations too
        assert_eq!(decls[1].name, "a");
    }

    #[test]
    fn test_void_parameter_list() {
        let decls = scan("void main(void) {}");
        assert_eq!(decls[0].signature(), "void main()");
    }

    #[test]
    fn test_const_variable_with_comment() {
        let decls = scan("/* limit */\nconst int MAX_HP = 10;\nobject oPC;");

        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].kind, DeclarationKind::Variable);
        assert_eq!(decls[0].comment.as_deref(), Some("limit"));
        assert_eq!(decls[1].comment, None);
    }

    #[test]
    fn test_comment_separated_by_blank_line_is_ignored() {
        let decls = scan("// unrelated\n\nint x;");
        assert_eq!(decls[0].comment, None);
    }

    #[test]
    fn test_unclosed_parameter_list() {
        let decls = scan("int Broken(int a;\nint y;");
        assert_eq!(decls[0].signature(), "int Broken(int a)");
        assert_eq!(find_declaration(&decls, "y").map(|d| d.is_function()), Some(false));
    }
}
