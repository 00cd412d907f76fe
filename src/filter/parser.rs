//! Recursive-descent parser for filter expressions.
//!
//! `or` binds weaker than `and`; both chains are split at their top-level
//! keywords first, so a failing term never hides errors of its siblings.

use super::ast::{AttributeFilter, Comparison, Filter, Literal};
use super::lexer::{Encoded, Token, check_brackets, matching_close, tokenize};
use super::operator::OperatorRegistry;
use crate::error::ValidationError;
use crate::issues::{Location, ValidationIssues};
use crate::value_objects::AttrRef;
use log::debug;
use serde_json::Value;
use std::str::FromStr;

impl Filter {
    /// Parse a filter expression, resolving operators through `operators`.
    ///
    /// All errors are reported at the root location. Errors of sibling terms
    /// are collected together.
    pub fn parse(input: &str, operators: &OperatorRegistry) -> Result<Filter, ValidationIssues> {
        let mut issues = ValidationIssues::new();
        let (encoded, unterminated) = Encoded::new(input);

        if let Err(error) = check_brackets(&encoded, input) {
            issues.add_error(error, false, Location::root());
            return Err(rejected(input, issues));
        }
        if let Some(operand) = unterminated {
            issues.add_error(ValidationError::BadOperand { operand }, false, Location::root());
            return Err(rejected(input, issues));
        }

        let tokens = tokenize(&encoded);
        if tokens.is_empty() {
            issues.add_error(ValidationError::EmptyExpression, false, Location::root());
            return Err(rejected(input, issues));
        }

        let mut parser = Parser {
            encoded: &encoded,
            operators,
            issues,
        };
        match parser.disjunction(&tokens, None) {
            Some(filter) if !parser.issues.has_errors() => Ok(filter),
            _ => {
                if !parser.issues.has_errors() {
                    parser.error(ValidationError::UnknownExpression {
                        expression: input.to_string(),
                    });
                }
                Err(rejected(input, parser.issues))
            }
        }
    }
}

impl FromStr for Filter {
    type Err = ValidationIssues;

    /// Parse with the built-in operators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::parse(s, OperatorRegistry::defaults())
    }
}

fn rejected(input: &str, issues: ValidationIssues) -> ValidationIssues {
    debug!(
        "Rejected filter '{}' with {} error(s)",
        input,
        issues.errors().count()
    );
    issues
}

type PartParser<'a> = fn(&mut Parser<'a>, &[Token], Option<&AttrRef>) -> Option<Filter>;

struct Parser<'a> {
    encoded: &'a Encoded,
    operators: &'a OperatorRegistry,
    issues: ValidationIssues,
}

impl<'a> Parser<'a> {
    fn error(&mut self, error: ValidationError) {
        self.issues.add_error(error, false, Location::root());
    }

    fn render(&self, tokens: &[Token]) -> String {
        self.encoded.render(tokens)
    }

    fn disjunction(&mut self, tokens: &[Token], scope: Option<&AttrRef>) -> Option<Filter> {
        self.chain(tokens, "or", scope, Self::conjunction, Filter::or)
    }

    fn conjunction(&mut self, tokens: &[Token], scope: Option<&AttrRef>) -> Option<Filter> {
        self.chain(tokens, "and", scope, Self::term, Filter::and)
    }

    /// Parse `part (keyword part)*`, joining parts left-associatively.
    fn chain(
        &mut self,
        tokens: &[Token],
        keyword: &str,
        scope: Option<&AttrRef>,
        parse_part: PartParser<'a>,
        join: fn(Filter, Filter) -> Filter,
    ) -> Option<Filter> {
        let parts = split_at_keyword(tokens, keyword);
        let mut joined: Option<Filter> = None;
        let mut failed = false;
        let mut missing_reported = false;

        for part in parts {
            if part.is_empty() {
                if !missing_reported {
                    self.error(ValidationError::MissingOperand {
                        operator: keyword.to_string(),
                        expression: self.render(tokens),
                    });
                    missing_reported = true;
                }
                failed = true;
                continue;
            }
            match parse_part(self, part, scope) {
                Some(filter) => {
                    joined = Some(match joined {
                        Some(left) => join(left, filter),
                        None => filter,
                    })
                }
                None => failed = true,
            }
        }

        if failed { None } else { joined }
    }

    fn term(&mut self, tokens: &[Token], scope: Option<&AttrRef>) -> Option<Filter> {
        match tokens {
            [Token::Word(word, _), rest @ ..] if word.eq_ignore_ascii_case("not") => {
                if rest.is_empty() {
                    self.error(ValidationError::MissingOperand {
                        operator: "not".to_string(),
                        expression: self.render(tokens),
                    });
                    return None;
                }
                self.term(rest, scope).map(Filter::negate)
            }
            [Token::Open('(', _), ..] if matching_close(tokens, 0) == Some(tokens.len() - 1) => {
                let inner = &tokens[1..tokens.len() - 1];
                if inner.is_empty() {
                    self.error(ValidationError::EmptyExpression);
                    return None;
                }
                self.disjunction(inner, scope).map(Filter::group)
            }
            [Token::Word(path, _), Token::Open('[', _), ..]
                if matching_close(tokens, 1) == Some(tokens.len() - 1) =>
            {
                self.complex_group(path, &tokens[2..tokens.len() - 1], tokens, scope)
            }
            [Token::Word(path, _), Token::Word(operator, _)] => {
                let attr = self.attr_path(path, tokens, scope);
                let comparison = self.unary(operator, tokens);
                Some(Filter::Attribute(AttributeFilter::new(attr?, comparison?)))
            }
            [Token::Word(path, _), Token::Word(operator, _), Token::Word(operand, _)] => {
                let attr = self.attr_path(path, tokens, scope);
                let comparison = self.binary(operator, operand, tokens);
                Some(Filter::Attribute(AttributeFilter::new(attr?, comparison?)))
            }
            _ => {
                self.error(ValidationError::UnknownExpression {
                    expression: self.render(tokens),
                });
                None
            }
        }
    }

    fn complex_group(
        &mut self,
        path: &str,
        inner: &[Token],
        tokens: &[Token],
        scope: Option<&AttrRef>,
    ) -> Option<Filter> {
        if let Some(parent) = scope {
            self.error(ValidationError::ComplexSubAttribute {
                attribute: parent.to_string(),
                expression: self.render(tokens),
            });
            return None;
        }
        let attr = self.attr_path(path, tokens, None)?;
        if attr.is_sub_attr() {
            self.error(ValidationError::ComplexSubAttribute {
                attribute: attr.to_string(),
                expression: self.render(tokens),
            });
            return None;
        }
        if inner.is_empty() {
            self.error(ValidationError::EmptyExpression);
            return None;
        }
        let filter = self.disjunction(inner, Some(&attr))?;
        Some(Filter::complex(attr, filter))
    }

    /// Attribute path of a term. Inside a complex group only plain
    /// sub-attribute names of the group's attribute are allowed.
    fn attr_path(
        &mut self,
        word: &str,
        tokens: &[Token],
        scope: Option<&AttrRef>,
    ) -> Option<AttrRef> {
        let path = self.encoded.decode(word);
        let attr = match AttrRef::parse(&path) {
            Ok(attr) => attr,
            Err(error) => {
                self.error(error);
                return None;
            }
        };
        if let Some(parent) = scope {
            if attr.is_sub_attr() || attr.schema().is_some() {
                self.error(ValidationError::ComplexSubAttribute {
                    attribute: parent.to_string(),
                    expression: self.render(tokens),
                });
                return None;
            }
        }
        Some(attr)
    }

    fn unary(&mut self, token: &str, tokens: &[Token]) -> Option<Comparison> {
        if let Some(operator) = self.operators.get_unary(token) {
            return Some(Comparison::Unary(operator.clone()));
        }
        let error = if self.operators.get_binary(token).is_some() {
            ValidationError::MissingOperand {
                operator: token.to_lowercase(),
                expression: self.render(tokens),
            }
        } else {
            ValidationError::UnknownOperator {
                operator_type: "unary".to_string(),
                operator: self.encoded.decode(token),
                expression: self.render(tokens),
            }
        };
        self.error(error);
        None
    }

    fn binary(&mut self, token: &str, operand: &str, tokens: &[Token]) -> Option<Comparison> {
        let Some(operator) = self.operators.get_binary(token).cloned() else {
            let error = if self.operators.get_unary(token).is_some() {
                ValidationError::UnknownExpression {
                    expression: self.render(tokens),
                }
            } else {
                ValidationError::UnknownOperator {
                    operator_type: "binary".to_string(),
                    operator: self.encoded.decode(token),
                    expression: self.render(tokens),
                }
            };
            self.error(error);
            return None;
        };

        let literal = self.literal(operand)?;
        if !operator.supports_operand(&literal) {
            self.error(ValidationError::NonCompatibleOperand {
                operator: operator.token().to_lowercase(),
                operand_type: literal.type_name().to_string(),
            });
            return None;
        }
        Some(Comparison::Binary(operator, literal))
    }

    /// Resolve a literal word: a quoted string placeholder or a bare JSON
    /// `true`, `false`, `null` or number.
    fn literal(&mut self, word: &str) -> Option<Literal> {
        let parsed = match self.encoded.literal(word) {
            Some(quoted) => serde_json::from_str::<String>(quoted)
                .ok()
                .map(Literal::String),
            None => match serde_json::from_str::<Value>(word) {
                Ok(Value::Bool(b)) => Some(Literal::Boolean(b)),
                Ok(Value::Null) => Some(Literal::Null),
                Ok(Value::Number(n)) => match n.as_i64() {
                    Some(i) => Some(Literal::Integer(i)),
                    None => n.as_f64().map(|value| Literal::Decimal {
                        value,
                        raw: word.to_string(),
                    }),
                },
                _ => None,
            },
        };
        if parsed.is_none() {
            self.error(ValidationError::BadOperand {
                operand: self.encoded.decode(word),
            });
        }
        parsed
    }
}

/// Split `tokens` at every top-level occurrence of `keyword`.
fn split_at_keyword<'t>(tokens: &'t [Token], keyword: &str) -> Vec<&'t [Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            Token::Open(..) => depth += 1,
            Token::Close(..) => depth = depth.saturating_sub(1),
            Token::Word(word, _) if depth == 0 && word.eq_ignore_ascii_case(keyword) => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            Token::Word(..) => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Filter, ValidationIssues> {
        Filter::from_str(input)
    }

    fn error_codes(input: &str) -> Vec<u16> {
        match parse(input) {
            Err(issues) => issues.error_codes_at(Location::root()),
            Ok(filter) => panic!("Expected '{}' to be rejected, got {:?}", input, filter),
        }
    }

    #[test]
    fn test_attribute_expressions() {
        let filter = parse(r#"userName eq "bjensen""#).unwrap();
        match &filter {
            Filter::Attribute(attr_filter) => {
                assert_eq!(attr_filter.attr().to_string(), "userName");
                assert_eq!(attr_filter.comparison().token(), "eq");
                assert_eq!(
                    attr_filter.comparison().operand(),
                    Some(&Literal::String("bjensen".to_string()))
                );
            }
            other => panic!("Expected attribute filter, got {:?}", other),
        }

        match parse("title PR").unwrap() {
            Filter::Attribute(attr_filter) => assert!(attr_filter.comparison().is_unary()),
            other => panic!("Expected attribute filter, got {:?}", other),
        }
    }

    #[test]
    fn test_literals() {
        let operand = |input: &str| match parse(input).unwrap() {
            Filter::Attribute(attr_filter) => attr_filter.comparison().operand().cloned(),
            other => panic!("Expected attribute filter, got {:?}", other),
        };
        assert_eq!(operand("active eq true"), Some(Literal::Boolean(true)));
        assert_eq!(operand("title eq null"), Some(Literal::Null));
        assert_eq!(operand("age gt 42"), Some(Literal::Integer(42)));
        assert_eq!(
            operand("score ge 1.50"),
            Some(Literal::Decimal {
                value: 1.5,
                raw: "1.50".to_string()
            })
        );
        assert_eq!(
            operand(r#"title eq "a \"quoted\" and (bracketed] text""#),
            Some(Literal::String(
                "a \"quoted\" and (bracketed] text".to_string()
            ))
        );
    }

    #[test]
    fn test_precedence() {
        let filter = parse("a pr or b pr and c pr").unwrap();
        match filter {
            Filter::Or(left, right) => {
                assert!(matches!(*left, Filter::Attribute(_)));
                assert!(matches!(*right, Filter::And(_, _)));
            }
            other => panic!("Expected or at the root, got {:?}", other),
        }

        let filter = parse("not (a pr or b pr) and c pr").unwrap();
        match filter {
            Filter::And(left, _) => match *left {
                Filter::Not(inner) => assert!(matches!(*inner, Filter::Group(_))),
                other => panic!("Expected not, got {:?}", other),
            },
            other => panic!("Expected and at the root, got {:?}", other),
        }
    }

    #[test]
    fn test_complex_group() {
        let filter = parse(r#"emails[type eq "work" and value co "@example.com"]"#).unwrap();
        match filter {
            Filter::Complex { attr, filter } => {
                assert_eq!(attr.to_string(), "emails");
                assert!(matches!(*filter, Filter::And(_, _)));
            }
            other => panic!("Expected complex filter, got {:?}", other),
        }
    }

    #[test]
    fn test_canonical_serialization() {
        let cases = [
            (r#"userName Eq "bjensen""#, r#"userName eq "bjensen""#),
            ("title  pr   AND  active eq true", "title pr and active eq true"),
            (
                r#"emails[ type eq "work" ]  or NOT (x pr)"#,
                r#"emails[type eq "work"] or not (x pr)"#,
            ),
            (r#"title eq "tab\tand A""#, r#"title eq "tab\tand A""#),
        ];
        for (input, expected) in cases {
            assert_eq!(parse(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_bracket_errors() {
        assert_eq!(error_codes("(userName pr"), vec![100]);
        assert_eq!(error_codes(r#"emails[type eq "work""#), vec![100]);
        assert_eq!(error_codes(r#"userName eq "bjensen"#), vec![105]);
    }

    #[test]
    fn test_empty_expressions() {
        assert_eq!(error_codes(""), vec![101]);
        assert_eq!(error_codes("   "), vec![101]);
        assert_eq!(error_codes("()"), vec![101]);
        assert_eq!(error_codes("emails[]"), vec![101]);
    }

    #[test]
    fn test_operator_errors() {
        assert_eq!(error_codes(r#"userName xx "a""#), vec![102]);
        assert_eq!(error_codes("userName xx"), vec![102]);
        assert_eq!(error_codes("userName eq"), vec![103]);
        assert_eq!(error_codes("and userName pr"), vec![103]);
        assert_eq!(error_codes("userName pr or"), vec![103]);
        assert_eq!(error_codes("userName pr and not"), vec![103]);
    }

    #[test]
    fn test_complex_group_restrictions() {
        assert_eq!(error_codes("emails[value.x pr]"), vec![104]);
        assert_eq!(error_codes("emails[type[value pr]]"), vec![104]);
        assert_eq!(error_codes("name.givenName[value pr]"), vec![104]);
    }

    #[test]
    fn test_operand_errors() {
        assert_eq!(error_codes("userName eq bjensen"), vec![105]);
        assert_eq!(error_codes("title co 42"), vec![106]);
        assert_eq!(error_codes("active gt true"), vec![106]);
        assert_eq!(error_codes("title lt null"), vec![106]);
    }

    #[test]
    fn test_attribute_and_expression_errors() {
        assert_eq!(error_codes("1abc pr"), vec![107]);
        assert_eq!(error_codes("a.b.c pr"), vec![107]);
        assert_eq!(error_codes("naïve pr"), vec![107]);
        assert_eq!(error_codes(r#"name.fämilyName eq "x""#), vec![107]);
        assert_eq!(error_codes("userName"), vec![108]);
        assert_eq!(error_codes(r#"userName eq "a" "b""#), vec![108]);
        assert_eq!(error_codes("title pr 1"), vec![108]);
    }

    #[test]
    fn test_errors_quote_the_input_text() {
        let expression = |input: &str| match parse(input) {
            Err(issues) => issues.errors().map(|(_, error)| error.to_string()).collect::<Vec<_>>(),
            Ok(filter) => panic!("Expected '{}' to be rejected, got {:?}", input, filter),
        };

        assert_eq!(
            expression(r#"members[value eq "a]b"].displayName"#),
            vec![r#"unknown expression 'members[value eq "a]b"].displayName'"#]
        );
        assert_eq!(
            expression(r#"title pr and userName  eq "a (b"  "c""#),
            vec![r#"unknown expression 'userName  eq "a (b"  "c"'"#]
        );
    }

    #[test]
    fn test_sibling_errors_are_collected() {
        let codes = error_codes(r#"userName xx "a" and title co 1 or 9x pr"#);
        assert_eq!(codes, vec![102, 106, 107]);
    }
}
