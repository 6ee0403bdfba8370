use std::sync::Arc;

use tower_lsp::lsp_types::{
    ParameterInformation, ParameterLabel, Position, SignatureHelp, SignatureInformation, Url,
};

use super::to_location;
use crate::core::document::DocumentStateStore;
use crate::parser::{
    find_declaration, find_declarations, DeclarationKind, Location, Token, TokenKind,
};

pub struct SignatureHelpProvider {
    documents: Arc<DocumentStateStore>,
}

/// An open `(` seen while walking towards the cursor
struct OpenCall<'a> {
    callee: Option<&'a str>,
    active_parameter: u32,
}

impl SignatureHelpProvider {
    pub fn new(documents: Arc<DocumentStateStore>) -> Self {
        Self { documents }
    }

    pub async fn signature_help(&self, uri: &Url, position: Position) -> Option<SignatureHelp> {
        let document = self.documents.get(uri).await?;
        let call = innermost_call(&document.tokens, to_location(position))?;

        let declarations = find_declarations(&document.tokens);
        let declaration = find_declaration(&declarations, call.callee?)?;
        let DeclarationKind::Function { parameters } = &declaration.kind else {
            return None;
        };

        let information = SignatureInformation {
            label: declaration.signature(),
            documentation: None,
            parameters: Some(
                parameters
                    .iter()
                    .map(|p| ParameterInformation {
                        label: ParameterLabel::Simple(p.clone()),
                        documentation: None,
                    })
                    .collect(),
            ),
            active_parameter: None,
        };

        Some(SignatureHelp {
            signatures: vec![information],
            active_signature: Some(0),
            active_parameter: Some(call.active_parameter),
        })
    }
}

/// Innermost call still open at `location`
fn innermost_call(tokens: &[Token], location: Location) -> Option<OpenCall<'_>> {
    let mut stack: Vec<OpenCall<'_>> = Vec::new();
    let mut previous: Option<&Token> = None;

    for token in tokens
        .iter()
        .filter(|t| t.kind != TokenKind::Comment)
        .take_while(|t| t.end <= location)
    {
        if token.is_punct("(") {
            stack.push(OpenCall {
                callee: previous
                    .filter(|p| p.kind == TokenKind::Identifier)
                    .map(|p| p.text.as_str()),
                active_parameter: 0,
            });
        } else if token.is_punct(")") {
            stack.pop();
        } else if token.is_punct(",") {
            if let Some(call) = stack.last_mut() {
                call.active_parameter += 1;
            }
        } else if token.is_punct(";") || token.is_punct("{") || token.is_punct("}") {
            stack.clear();
        }
        previous = Some(token);
    }

    stack.pop()
}
