use codemap::Spanned;

use crate::{
    ast::{AstExpr, AstSassMap, BinaryOpExpr, Interpolation, ListExpr, Number, StringExpr},
    color::{Color, NAMED_COLORS},
    common::{unvendor, BinaryOp, Brackets, Identifier, ListSeparator, QuoteKind, UnaryOp},
    context_flags::ContextFlags,
    error::SassResult,
    lexer::Token,
    unit::Unit,
    utils::as_hex,
};

use super::{BaseParser, StylesheetParser};

pub(crate) type Predicate<'a> = &'a dyn Fn(&mut StylesheetParser<'_>) -> SassResult<bool>;

/// Parses a single expression out of the stylesheet parser's token stream.
///
/// Lists are accumulated bottom-up: space-separated operands collect into
/// `space_expressions`, comma-separated elements into `comma_expressions`,
/// and binary operators climb by precedence through the explicit
/// operator/operand stacks. A level that ends up containing a single element
/// hands that element back unwrapped.
pub(crate) struct ValueParser<'c> {
    comma_expressions: Option<Vec<Spanned<AstExpr>>>,
    space_expressions: Option<Vec<Spanned<AstExpr>>>,
    binary_operators: Option<Vec<BinaryOp>>,
    operands: Option<Vec<Spanned<AstExpr>>>,
    allow_slash: bool,
    single_expression: Option<Spanned<AstExpr>>,
    start: usize,
    inside_bracketed_list: bool,
    single_equals: bool,
    parse_until: Option<Predicate<'c>>,
}

impl<'c> ValueParser<'c> {
    pub fn parse_expression(
        parser: &mut StylesheetParser,
        parse_until: Option<Predicate<'c>>,
        inside_bracketed_list: bool,
        single_equals: bool,
    ) -> SassResult<Spanned<AstExpr>> {
        parser.whitespace()?;

        let start = parser.toks.cursor();

        let mut value_parser = Self::new(parse_until, inside_bracketed_list, single_equals, start);

        if let Some(parse_until) = value_parser.parse_until {
            if parse_until(parser)? {
                return Err(("Expected expression.", parser.toks.current_span()).into());
            }
        }

        if value_parser.inside_bracketed_list {
            parser.enter_nesting()?;
            parser.expect_char('[')?;
            parser.whitespace()?;

            if parser.scan_char(']') {
                parser.exit_nesting();
                return Ok(AstExpr::List(ListExpr {
                    elems: Vec::new(),
                    separator: ListSeparator::Undecided,
                    brackets: Brackets::Bracketed,
                })
                .span(parser.toks.span_from(start)));
            }
        }

        value_parser.single_expression = Some(value_parser.parse_single_expression(parser)?);

        let value = value_parser.parse_value(parser);

        if inside_bracketed_list {
            parser.exit_nesting();
        }

        value
    }

    fn new(
        parse_until: Option<Predicate<'c>>,
        inside_bracketed_list: bool,
        single_equals: bool,
        start: usize,
    ) -> Self {
        Self {
            comma_expressions: None,
            space_expressions: None,
            binary_operators: None,
            operands: None,
            allow_slash: true,
            single_expression: None,
            start,
            parse_until,
            inside_bracketed_list,
            single_equals,
        }
    }

    /// Parse a value from a stream of tokens.
    ///
    /// This function will cease parsing if the predicate returns true.
    fn parse_value(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        parser.whitespace()?;

        let span = parser.toks.current_span();

        loop {
            parser.whitespace()?;

            if let Some(parse_until) = self.parse_until {
                if parse_until(parser)? {
                    break;
                }
            }

            let first = parser.toks.peek();

            match first {
                Some(Token { kind: '(', .. }) => {
                    let expr = self.parse_paren_expr(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '[', .. }) => {
                    let expr = Self::parse_expression(parser, None, true, false)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '$', .. }) => {
                    let expr = self.parse_variable(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '&', .. }) => {
                    let expr = self.parse_selector(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '"', .. }) | Some(Token { kind: '\'', .. }) => {
                    let string = parser.parse_interpolated_string()?;
                    let string_span = string.span;
                    let expr = string.map_node(|s| AstExpr::String(s, string_span));
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '#', .. }) => {
                    let expr = self.parse_hash(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '=', .. }) => {
                    parser.toks.next();
                    if self.single_equals
                        && !matches!(parser.toks.peek(), Some(Token { kind: '=', .. }))
                    {
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::SingleEq,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    } else {
                        parser.expect_char('=')?;
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::Equal,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    }
                }
                Some(Token { kind: '!', .. }) => match parser.toks.peek_n(1) {
                    Some(Token { kind: '=', .. }) => {
                        parser.toks.next();
                        parser.toks.next();
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::NotEqual,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    }
                    Some(Token { kind, .. })
                        if kind.is_ascii_whitespace() || kind == 'i' || kind == 'I' =>
                    {
                        let expr = self.parse_important_expr(parser)?;
                        self.add_single_expression(expr, parser)?;
                    }
                    None => {
                        let expr = self.parse_important_expr(parser)?;
                        self.add_single_expression(expr, parser)?;
                    }
                    Some(..) => break,
                },
                Some(Token { kind: '<', .. }) => {
                    parser.toks.next();
                    self.add_operator(
                        Spanned {
                            node: if parser.scan_char('=') {
                                BinaryOp::LessThanEqual
                            } else {
                                BinaryOp::LessThan
                            },
                            span: parser.toks.prev_span(),
                        },
                        parser,
                    )?;
                }
                Some(Token { kind: '>', .. }) => {
                    parser.toks.next();
                    self.add_operator(
                        Spanned {
                            node: if parser.scan_char('=') {
                                BinaryOp::GreaterThanEqual
                            } else {
                                BinaryOp::GreaterThan
                            },
                            span: parser.toks.prev_span(),
                        },
                        parser,
                    )?;
                }
                Some(Token { kind: '*', .. }) => {
                    parser.toks.next();
                    self.add_operator(
                        Spanned {
                            node: BinaryOp::Mul,
                            span: parser.toks.prev_span(),
                        },
                        parser,
                    )?;
                }
                Some(Token { kind: '+', .. }) => {
                    if self.single_expression.is_none() {
                        let expr = self.parse_unary_operation(parser)?;
                        self.add_single_expression(expr, parser)?;
                    } else {
                        parser.toks.next();
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::Plus,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    }
                }
                Some(Token { kind: '-', .. }) => {
                    if matches!(
                        parser.toks.peek_n(1),
                        Some(Token {
                            kind: '0'..='9' | '.',
                            ..
                        })
                    ) && (self.single_expression.is_none()
                        || matches!(
                            parser.toks.peek_previous(),
                            Some(Token {
                                kind: ' ' | '\t' | '\n' | '\r',
                                ..
                            })
                        ))
                    {
                        let expr = self.parse_number(parser)?;
                        self.add_single_expression(expr, parser)?;
                    } else if parser.looking_at_interpolated_identifier() {
                        let expr = self.parse_identifier_like(parser)?;
                        self.add_single_expression(expr, parser)?;
                    } else if self.single_expression.is_none() {
                        let expr = self.parse_unary_operation(parser)?;
                        self.add_single_expression(expr, parser)?;
                    } else {
                        parser.toks.next();
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::Minus,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    }
                }
                Some(Token { kind: '/', .. }) => {
                    if self.single_expression.is_none() {
                        let expr = self.parse_unary_operation(parser)?;
                        self.add_single_expression(expr, parser)?;
                    } else {
                        parser.toks.next();
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::Div,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    }
                }
                Some(Token { kind: '%', .. }) => {
                    parser.toks.next();
                    self.add_operator(
                        Spanned {
                            node: BinaryOp::Rem,
                            span: parser.toks.prev_span(),
                        },
                        parser,
                    )?;
                }
                Some(Token {
                    kind: '0'..='9', ..
                }) => {
                    let expr = self.parse_number(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: '.', .. }) => {
                    if matches!(parser.toks.peek_n(1), Some(Token { kind: '.', .. })) {
                        break;
                    }
                    let expr = self.parse_number(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: 'a', .. }) | Some(Token { kind: 'A', .. }) => {
                    if parser.scan_identifier("and", false)? {
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::And,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    } else {
                        let expr = self.parse_identifier_like(parser)?;
                        self.add_single_expression(expr, parser)?;
                    }
                }
                Some(Token { kind: 'o', .. }) | Some(Token { kind: 'O', .. }) => {
                    if parser.scan_identifier("or", false)? {
                        self.add_operator(
                            Spanned {
                                node: BinaryOp::Or,
                                span: parser.toks.prev_span(),
                            },
                            parser,
                        )?;
                    } else {
                        let expr = self.parse_identifier_like(parser)?;
                        self.add_single_expression(expr, parser)?;
                    }
                }
                Some(Token { kind: 'u', .. }) | Some(Token { kind: 'U', .. }) => {
                    if matches!(parser.toks.peek_n(1), Some(Token { kind: '+', .. })) {
                        let expr = self.parse_unicode_range(parser)?;
                        self.add_single_expression(expr, parser)?;
                    } else {
                        let expr = self.parse_identifier_like(parser)?;
                        self.add_single_expression(expr, parser)?;
                    }
                }
                Some(Token {
                    kind: 'b'..='z', ..
                })
                | Some(Token {
                    kind: 'B'..='Z', ..
                })
                | Some(Token { kind: '_', .. })
                | Some(Token { kind: '\\', .. })
                | Some(Token {
                    kind: '\u{80}'..=std::char::MAX,
                    ..
                }) => {
                    let expr = self.parse_identifier_like(parser)?;
                    self.add_single_expression(expr, parser)?;
                }
                Some(Token { kind: ',', .. }) => {
                    // If we discover we're parsing a list whose first element
                    // is a division operation, and we're in parentheses,
                    // reparse outside of a paren context. This ensures that
                    // `(1/2, 1)` doesn't perform division on its first
                    // element.
                    if parser.flags.in_parens() {
                        parser.flags.set(ContextFlags::IN_PARENS, false);
                        if self.allow_slash {
                            self.reset_state(parser)?;
                            continue;
                        }
                    }

                    if self.single_expression.is_none() {
                        return Err(("Expected expression.", parser.toks.current_span()).into());
                    }

                    self.resolve_space_expressions(parser)?;

                    // [resolve_space_expressions] can modify
                    // [single_expression], but it can't set it to `None`.
                    self.comma_expressions
                        .get_or_insert_with(Default::default)
                        .push(self.single_expression.take().unwrap());
                    parser.toks.next();
                    self.allow_slash = true;
                }
                Some(..) | None => break,
            }
        }

        if self.inside_bracketed_list {
            parser.expect_char(']')?;
        }

        let span = span.merge(parser.toks.prev_span());

        if self.comma_expressions.is_some() {
            self.resolve_space_expressions(parser)?;

            if let Some(single_expression) = self.single_expression.take() {
                self.comma_expressions
                    .as_mut()
                    .unwrap()
                    .push(single_expression);
            }

            Ok(AstExpr::List(ListExpr {
                elems: self.comma_expressions.take().unwrap(),
                separator: ListSeparator::Comma,
                brackets: if self.inside_bracketed_list {
                    Brackets::Bracketed
                } else {
                    Brackets::None
                },
            })
            .span(span))
        } else if self.inside_bracketed_list && self.space_expressions.is_some() {
            self.resolve_operations(parser)?;

            self.space_expressions
                .as_mut()
                .unwrap()
                .push(self.single_expression.take().unwrap());

            Ok(AstExpr::List(ListExpr {
                elems: self.space_expressions.take().unwrap(),
                separator: ListSeparator::Space,
                brackets: Brackets::Bracketed,
            })
            .span(span))
        } else {
            self.resolve_space_expressions(parser)?;

            if self.inside_bracketed_list {
                return Ok(AstExpr::List(ListExpr {
                    elems: vec![self.single_expression.take().unwrap()],
                    separator: ListSeparator::Undecided,
                    brackets: Brackets::Bracketed,
                })
                .span(span));
            }

            Ok(self.single_expression.take().unwrap())
        }
    }

    fn parse_single_expression(
        &mut self,
        parser: &mut StylesheetParser,
    ) -> SassResult<Spanned<AstExpr>> {
        let first = parser.toks.peek();

        match first {
            Some(Token { kind: '(', .. }) => self.parse_paren_expr(parser),
            Some(Token { kind: '/', .. }) => self.parse_unary_operation(parser),
            Some(Token { kind: '[', .. }) => Self::parse_expression(parser, None, true, false),
            Some(Token { kind: '$', .. }) => self.parse_variable(parser),
            Some(Token { kind: '&', .. }) => self.parse_selector(parser),
            Some(Token { kind: '"', .. }) | Some(Token { kind: '\'', .. }) => {
                let string = parser.parse_interpolated_string()?;
                let string_span = string.span;
                Ok(string.map_node(|s| AstExpr::String(s, string_span)))
            }
            Some(Token { kind: '#', .. }) => self.parse_hash(parser),
            Some(Token { kind: '+', .. }) => self.parse_plus_expr(parser),
            Some(Token { kind: '-', .. }) => self.parse_minus_expr(parser),
            Some(Token { kind: '!', .. }) => self.parse_important_expr(parser),
            Some(Token { kind: 'u', .. }) | Some(Token { kind: 'U', .. }) => {
                if matches!(parser.toks.peek_n(1), Some(Token { kind: '+', .. })) {
                    self.parse_unicode_range(parser)
                } else {
                    self.parse_identifier_like(parser)
                }
            }
            Some(Token {
                kind: '0'..='9', ..
            })
            | Some(Token { kind: '.', .. }) => self.parse_number(parser),
            Some(Token {
                kind: 'a'..='z', ..
            })
            | Some(Token {
                kind: 'A'..='Z', ..
            })
            | Some(Token { kind: '_', .. })
            | Some(Token { kind: '\\', .. })
            | Some(Token {
                kind: '\u{80}'..=std::char::MAX,
                ..
            }) => self.parse_identifier_like(parser),
            Some(..) | None => Err(("Expected expression.", parser.toks.current_span()).into()),
        }
    }

    fn resolve_one_operation(&mut self, parser: &mut StylesheetParser) -> SassResult<()> {
        let operator = self.binary_operators.as_mut().unwrap().pop().unwrap();
        let operands = self.operands.as_mut().unwrap();

        let left = operands.pop().unwrap();
        let right = match self.single_expression.take() {
            Some(val) => val,
            None => return Err(("Expected expression.", left.span).into()),
        };

        let span = left.span.merge(right.span);

        if self.allow_slash
            && !parser.flags.in_parens()
            && operator == BinaryOp::Div
            && left.node.is_slash_operand()
            && right.node.is_slash_operand()
        {
            self.single_expression = Some(AstExpr::slash(left.node, right.node, span).span(span));
        } else {
            self.single_expression = Some(
                AstExpr::BinaryOp(Box::new(BinaryOpExpr {
                    lhs: left.node,
                    op: operator,
                    rhs: right.node,
                    allows_slash: false,
                    span,
                }))
                .span(span),
            );
            self.allow_slash = false;
        }

        Ok(())
    }

    fn resolve_operations(&mut self, parser: &mut StylesheetParser) -> SassResult<()> {
        loop {
            let should_break = match self.binary_operators.as_ref() {
                Some(bin) => bin.is_empty(),
                None => true,
            };

            if should_break {
                break;
            }

            self.resolve_one_operation(parser)?;
        }

        Ok(())
    }

    fn add_single_expression(
        &mut self,
        expression: Spanned<AstExpr>,
        parser: &mut StylesheetParser,
    ) -> SassResult<()> {
        if self.single_expression.is_some() {
            // If we discover we're parsing a list whose first element is a
            // division operation, and we're in parentheses, reparse outside
            // of a paren context. This ensures that `(1/2 1)` doesn't
            // perform division on its first element.
            if parser.flags.in_parens() {
                parser.flags.set(ContextFlags::IN_PARENS, false);

                if self.allow_slash {
                    self.reset_state(parser)?;
                    return Ok(());
                }
            }

            if self.space_expressions.is_none() {
                self.space_expressions = Some(Vec::new());
            }

            self.resolve_operations(parser)?;

            self.space_expressions
                .as_mut()
                .unwrap()
                .push(self.single_expression.take().unwrap());

            self.allow_slash = true;
        }

        self.single_expression = Some(expression);

        Ok(())
    }

    fn add_operator(
        &mut self,
        op: Spanned<BinaryOp>,
        parser: &mut StylesheetParser,
    ) -> SassResult<()> {
        self.allow_slash = self.allow_slash && op.node == BinaryOp::Div;

        if self.binary_operators.is_none() {
            self.binary_operators = Some(Vec::new());
        }

        if self.operands.is_none() {
            self.operands = Some(Vec::new());
        }

        while let Some(&last_op) = self.binary_operators.as_ref().unwrap().last() {
            if last_op.precedence() < op.node.precedence() {
                break;
            }

            self.resolve_one_operation(parser)?;
        }
        self.binary_operators
            .get_or_insert_with(Default::default)
            .push(op.node);

        match self.single_expression.take() {
            Some(expr) => {
                self.operands.get_or_insert_with(Vec::new).push(expr);
            }
            None => return Err(("Expected expression.", op.span).into()),
        }

        parser.whitespace()?;

        self.single_expression = Some(self.parse_single_expression(parser)?);

        Ok(())
    }

    fn resolve_space_expressions(&mut self, parser: &mut StylesheetParser) -> SassResult<()> {
        self.resolve_operations(parser)?;

        if let Some(mut space_expressions) = self.space_expressions.take() {
            let single_expression = match self.single_expression.take() {
                Some(val) => val,
                None => return Err(("Expected expression.", parser.toks.current_span()).into()),
            };

            let span = space_expressions
                .first()
                .map_or(single_expression.span, |e| e.span)
                .merge(single_expression.span);

            space_expressions.push(single_expression);

            self.single_expression = Some(
                AstExpr::List(ListExpr {
                    elems: space_expressions,
                    separator: ListSeparator::Space,
                    brackets: Brackets::None,
                })
                .span(span),
            );
        }

        Ok(())
    }

    fn parse_map(
        &mut self,
        parser: &mut StylesheetParser,
        first: Spanned<AstExpr>,
    ) -> SassResult<Spanned<AstExpr>> {
        let start = self.start;
        let mut pairs = vec![(first, parser.parse_expression_until_comma(false)?.node)];

        while parser.scan_char(',') {
            parser.whitespace()?;
            if !parser.looking_at_expression() {
                break;
            }

            let key = parser.parse_expression_until_comma(false)?;
            parser.expect_char(':')?;
            parser.whitespace()?;
            let value = parser.parse_expression_until_comma(false)?;
            pairs.push((key, value.node));
        }

        parser.expect_char(')')?;

        Ok(AstExpr::Map(AstSassMap(pairs)).span(parser.toks.span_from(start)))
    }

    fn parse_paren_expr(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();

        parser.enter_nesting()?;

        let was_in_parentheses = parser.flags.in_parens();
        parser.flags.set(ContextFlags::IN_PARENS, true);

        let result = self.parse_paren_contents(parser, start);

        parser
            .flags
            .set(ContextFlags::IN_PARENS, was_in_parentheses);
        parser.exit_nesting();

        result
    }

    fn parse_paren_contents(
        &mut self,
        parser: &mut StylesheetParser,
        start: usize,
    ) -> SassResult<Spanned<AstExpr>> {
        parser.expect_char('(')?;
        parser.whitespace()?;
        if !parser.looking_at_expression() {
            parser.expect_char(')')?;
            return Ok(AstExpr::List(ListExpr {
                elems: Vec::new(),
                separator: ListSeparator::Undecided,
                brackets: Brackets::None,
            })
            .span(parser.toks.span_from(start)));
        }

        let first = parser.parse_expression_until_comma(false)?;
        if parser.scan_char(':') {
            parser.whitespace()?;
            return self.parse_map(parser, first);
        }

        if !parser.scan_char(',') {
            parser.expect_char(')')?;
            return Ok(AstExpr::Paren(Box::new(first.node)).span(parser.toks.span_from(start)));
        }

        parser.whitespace()?;

        let mut expressions = vec![first];

        loop {
            if !parser.looking_at_expression() {
                break;
            }
            expressions.push(parser.parse_expression_until_comma(false)?);
            if !parser.scan_char(',') {
                break;
            }
            parser.whitespace()?;
        }

        parser.expect_char(')')?;

        Ok(AstExpr::List(ListExpr {
            elems: expressions,
            separator: ListSeparator::Comma,
            brackets: Brackets::None,
        })
        .span(parser.toks.span_from(start)))
    }

    fn parse_variable(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();
        let name = parser.parse_variable_name()?;
        let span = parser.toks.span_from(start);

        Ok(AstExpr::Variable {
            name: Spanned {
                node: Identifier::from(name),
                span,
            },
            namespace: None,
        }
        .span(span))
    }

    fn parse_selector(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();
        parser.expect_char('&')?;

        if parser.toks.next_char_is('&') {
            parser.warn(
                parser.toks.current_span(),
                "In Sass, \"&&\" means two copies of the parent selector. You probably want to use \"and\" instead.",
            );
        }

        Ok(AstExpr::ParentSelector.span(parser.toks.span_from(start)))
    }

    fn parse_hash(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        debug_assert!(matches!(parser.toks.peek(), Some(Token { kind: '#', .. })));

        let start = parser.toks.cursor();

        if matches!(parser.toks.peek_n(1), Some(Token { kind: '{', .. })) {
            return self.parse_identifier_like(parser);
        }

        parser.expect_char('#')?;

        if matches!(
            parser.toks.peek(),
            Some(Token {
                kind: '0'..='9',
                ..
            })
        ) {
            let color = self.parse_hex_color_contents(parser, start)?;
            return Ok(AstExpr::Color(Box::new(color)).span(parser.toks.span_from(start)));
        }

        let after_hash = parser.toks.cursor();
        let ident = parser.parse_interpolated_identifier()?;
        if is_hex_color(&ident) {
            parser.toks.set_cursor(after_hash);
            let color = self.parse_hex_color_contents(parser, start)?;
            return Ok(AstExpr::Color(Box::new(color)).span(parser.toks.span_from(start)));
        }

        let mut buffer = Interpolation::new();

        buffer.add_char('#');
        buffer.add_interpolation(ident);

        let span = parser.toks.span_from(start);

        Ok(AstExpr::String(StringExpr(buffer, QuoteKind::None), span).span(span))
    }

    fn parse_hex_digit(&mut self, parser: &mut StylesheetParser) -> SassResult<u32> {
        match parser.toks.peek() {
            Some(Token { kind, .. }) if kind.is_ascii_hexdigit() => {
                parser.toks.next();
                Ok(as_hex(kind))
            }
            _ => Err(("Expected hex digit.", parser.toks.current_span()).into()),
        }
    }

    fn parse_hex_color_contents(
        &mut self,
        parser: &mut StylesheetParser,
        start: usize,
    ) -> SassResult<Color> {
        let digit1 = self.parse_hex_digit(parser)?;
        let digit2 = self.parse_hex_digit(parser)?;
        let digit3 = self.parse_hex_digit(parser)?;

        let red: u32;
        let green: u32;
        let blue: u32;
        let mut alpha: f64 = 1.0;

        if !parser.next_is_hex() {
            // #abc
            red = (digit1 << 4) + digit1;
            green = (digit2 << 4) + digit2;
            blue = (digit3 << 4) + digit3;
        } else {
            let digit4 = self.parse_hex_digit(parser)?;

            if !parser.next_is_hex() {
                // #abcd
                red = (digit1 << 4) + digit1;
                green = (digit2 << 4) + digit2;
                blue = (digit3 << 4) + digit3;
                alpha = ((digit4 << 4) + digit4) as f64 / 0xff as f64;
            } else {
                red = (digit1 << 4) + digit2;
                green = (digit3 << 4) + digit4;
                blue = (self.parse_hex_digit(parser)? << 4) + self.parse_hex_digit(parser)?;

                if parser.next_is_hex() {
                    alpha = ((self.parse_hex_digit(parser)? << 4) + self.parse_hex_digit(parser)?)
                        as f64
                        / 0xff as f64;
                }
            }
        }

        Ok(Color::new_rgba(
            red as u8,
            green as u8,
            blue as u8,
            alpha,
            parser.toks.raw_text(start),
        ))
    }

    fn parse_unary_operation(
        &mut self,
        parser: &mut StylesheetParser,
    ) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();
        let operator = self.expect_unary_operator(parser)?;

        parser.whitespace()?;

        let operand = self.parse_single_expression(parser)?;
        let span = parser.toks.span_from(start);

        Ok(AstExpr::UnaryOp(operator, Box::new(operand.node), span).span(span))
    }

    fn expect_unary_operator(&mut self, parser: &mut StylesheetParser) -> SassResult<UnaryOp> {
        Ok(match parser.toks.next() {
            Some(Token { kind: '+', .. }) => UnaryOp::Plus,
            Some(Token { kind: '-', .. }) => UnaryOp::Neg,
            Some(Token { kind: '/', .. }) => UnaryOp::Div,
            Some(..) | None => {
                return Err(("Expected unary operator.", parser.toks.current_span()).into())
            }
        })
    }

    fn parse_whole_number(&mut self, parser: &mut StylesheetParser) -> String {
        let mut buf = String::new();

        while let Some(tok) = parser.toks.peek() {
            if !tok.kind.is_ascii_digit() {
                break;
            }
            buf.push(tok.kind);
            parser.toks.next();
        }

        buf
    }

    fn parse_number(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();

        let mut number = String::new();

        if !parser.scan_char('+') && parser.scan_char('-') {
            number.push('-');
        }

        let whole = self.parse_whole_number(parser);
        let has_leading_zero = !whole.is_empty();
        number.push_str(&whole);

        if let Some(dec) = self.try_decimal(parser, !number.is_empty())? {
            number.push_str(&dec);
        }

        if let Some(exp) = self.try_exponent(parser)? {
            number.push_str(&exp);
        }

        let value: f64 = number
            .parse()
            .map_err(|_| ("Expected number.", parser.toks.span_from(start)))?;

        let unit = if parser.scan_char('%') {
            Unit::Percent
        } else if parser.looking_at_identifier()
            && (!matches!(parser.toks.peek(), Some(Token { kind: '-', .. }))
                || !matches!(parser.toks.peek_n(1), Some(Token { kind: '-', .. })))
        {
            Unit::from(parser.parse_identifier(false, true)?)
        } else {
            Unit::None
        };

        Ok(AstExpr::Number {
            n: Number::new(value, has_leading_zero),
            unit,
        }
        .span(parser.toks.span_from(start)))
    }

    fn try_decimal(
        &mut self,
        parser: &mut StylesheetParser,
        allow_trailing_dot: bool,
    ) -> SassResult<Option<String>> {
        if !matches!(parser.toks.peek(), Some(Token { kind: '.', .. })) {
            return Ok(None);
        }

        if let Some(Token { kind, .. }) = parser.toks.peek_n(1) {
            if !kind.is_ascii_digit() {
                if allow_trailing_dot {
                    return Ok(None);
                }
                return Err(("Expected digit.", parser.toks.current_span()).into());
            }
        }

        let mut buffer = String::new();

        parser.expect_char('.')?;
        buffer.push('.');

        while let Some(Token { kind, .. }) = parser.toks.peek() {
            if !kind.is_ascii_digit() {
                break;
            }
            buffer.push(kind);
            parser.toks.next();
        }

        Ok(Some(buffer))
    }

    fn try_exponent(&mut self, parser: &mut StylesheetParser) -> SassResult<Option<String>> {
        let mut buffer = String::new();

        match parser.toks.peek() {
            Some(Token {
                kind: 'e' | 'E', ..
            }) => buffer.push('e'),
            _ => return Ok(None),
        }

        let next = match parser.toks.peek_n(1) {
            Some(Token {
                kind: kind @ ('0'..='9' | '-' | '+'),
                ..
            }) => kind,
            _ => return Ok(None),
        };

        parser.toks.next();

        if next == '+' || next == '-' {
            parser.toks.next();
            buffer.push(next);
        }

        match parser.toks.peek() {
            Some(Token {
                kind: '0'..='9', ..
            }) => {}
            _ => return Err(("Expected digit.", parser.toks.current_span()).into()),
        }

        while let Some(tok) = parser.toks.peek() {
            if !tok.kind.is_ascii_digit() {
                break;
            }

            buffer.push(tok.kind);

            parser.toks.next();
        }

        Ok(Some(buffer))
    }

    fn parse_plus_expr(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        debug_assert!(matches!(parser.toks.peek(), Some(Token { kind: '+', .. })));
        match parser.toks.peek_n(1) {
            Some(Token {
                kind: '0'..='9' | '.',
                ..
            }) => self.parse_number(parser),
            _ => self.parse_unary_operation(parser),
        }
    }

    fn parse_minus_expr(&mut self, parser: &mut StylesheetParser) -> SassResult<Spanned<AstExpr>> {
        debug_assert!(matches!(parser.toks.peek(), Some(Token { kind: '-', .. })));

        if matches!(
            parser.toks.peek_n(1),
            Some(Token {
                kind: '0'..='9' | '.',
                ..
            })
        ) {
            return self.parse_number(parser);
        }

        if parser.looking_at_interpolated_identifier() {
            return self.parse_identifier_like(parser);
        }

        self.parse_unary_operation(parser)
    }

    fn parse_important_expr(
        &mut self,
        parser: &mut StylesheetParser,
    ) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();
        parser.expect_char('!')?;
        parser.whitespace()?;
        parser.expect_identifier("important", false)?;

        let span = parser.toks.span_from(start);

        Ok(AstExpr::String(
            StringExpr(
                Interpolation::new_plain("!important".to_owned()),
                QuoteKind::None,
            ),
            span,
        )
        .span(span))
    }

    fn parse_identifier_like(
        &mut self,
        parser: &mut StylesheetParser,
    ) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();

        let identifier = parser.parse_interpolated_identifier()?;
        let ident_span = parser.toks.span_from(start);

        let plain = identifier.as_plain().map(str::to_owned);
        let lower = plain.as_deref().map(str::to_ascii_lowercase);

        if let Some(plain) = plain.as_deref() {
            if plain == "not" {
                parser.whitespace()?;

                let value = self.parse_single_expression(parser)?;
                let span = parser.toks.span_from(start);

                return Ok(
                    AstExpr::UnaryOp(UnaryOp::Not, Box::new(value.node), span).span(span)
                );
            }

            let lower_ref = lower.as_deref().unwrap();

            if !parser.toks.next_char_is('(') {
                match plain {
                    "null" => return Ok(AstExpr::Null.span(ident_span)),
                    "true" => return Ok(AstExpr::True.span(ident_span)),
                    "false" => return Ok(AstExpr::False.span(ident_span)),
                    _ => {}
                }

                if let Some(color) = NAMED_COLORS.get(lower_ref) {
                    return Ok(AstExpr::Color(Box::new(Color::new_rgba(
                        color[0],
                        color[1],
                        color[2],
                        color[3] as f64 / 0xff as f64,
                        plain.to_owned(),
                    )))
                    .span(ident_span));
                }
            }

            if let Some(func) = self.try_parse_special_function(parser, plain, lower_ref, start)? {
                return Ok(func);
            }
        }

        match parser.toks.peek() {
            Some(Token { kind: '.', .. }) => {
                if matches!(parser.toks.peek_n(1), Some(Token { kind: '.', .. })) {
                    return Ok(
                        AstExpr::String(StringExpr(identifier, QuoteKind::None), ident_span)
                            .span(ident_span),
                    );
                }
                parser.toks.next();

                match plain {
                    Some(s) => self.parse_namespaced_expression(parser, &s, start),
                    None => Err((
                        "Interpolation isn't allowed in namespaces.",
                        ident_span,
                    )
                        .into()),
                }
            }
            Some(Token { kind: '(', .. }) => {
                if let Some(plain) = plain {
                    if lower.as_deref() == Some("content-exists") && !parser.flags.in_mixin() {
                        return Err((
                            "Cannot call content-exists() except within a mixin.",
                            ident_span,
                        )
                            .into());
                    }

                    let arguments = parser
                        .parse_argument_invocation(false, lower.as_deref() == Some("var"))?;

                    let span = parser.toks.span_from(start);

                    Ok(AstExpr::FunctionCall(crate::ast::FunctionCallExpr {
                        namespace: None,
                        name: Identifier::from(plain),
                        arguments: Box::new(arguments),
                        span,
                    })
                    .span(span))
                } else {
                    let arguments = parser.parse_argument_invocation(false, false)?;
                    let span = parser.toks.span_from(start);
                    Ok(
                        AstExpr::InterpolatedFunction(Box::new(crate::ast::InterpolatedFunction {
                            name: identifier,
                            arguments,
                            span,
                        }))
                        .span(span),
                    )
                }
            }
            _ => Ok(
                AstExpr::String(StringExpr(identifier, QuoteKind::None), ident_span)
                    .span(ident_span),
            ),
        }
    }

    fn parse_namespaced_expression(
        &mut self,
        parser: &mut StylesheetParser,
        namespace: &str,
        start: usize,
    ) -> SassResult<Spanned<AstExpr>> {
        let namespace = Spanned {
            node: Identifier::from(namespace),
            span: parser.toks.span_from(start),
        };

        if parser.toks.next_char_is('$') {
            let name_start = parser.toks.cursor();
            let name = parser.parse_variable_name()?;
            let span = parser.toks.span_from(start);

            return Ok(AstExpr::Variable {
                name: Spanned {
                    node: Identifier::from(name),
                    span: parser.toks.span_from(name_start),
                },
                namespace: Some(namespace),
            }
            .span(span));
        }

        let name = parser.parse_identifier(false, false)?;
        let arguments = parser.parse_argument_invocation(false, false)?;
        let span = parser.toks.span_from(start);

        Ok(AstExpr::FunctionCall(crate::ast::FunctionCallExpr {
            namespace: Some(namespace),
            name: Identifier::from(name),
            arguments: Box::new(arguments),
            span,
        })
        .span(span))
    }

    /// Consumes a `U+...` token and returns it as an unquoted string.
    fn parse_unicode_range(
        &mut self,
        parser: &mut StylesheetParser,
    ) -> SassResult<Spanned<AstExpr>> {
        let start = parser.toks.cursor();

        parser.expect_ident_char('u', false)?;
        parser.expect_char('+')?;

        let mut first_range_length = 0;
        while let Some(tok) = parser.toks.peek() {
            if !tok.kind.is_ascii_hexdigit() {
                break;
            }
            parser.toks.next();
            first_range_length += 1;
        }

        let mut has_question_mark = false;
        while parser.toks.next_char_is('?') {
            parser.toks.next();
            has_question_mark = true;
            first_range_length += 1;
        }

        if first_range_length == 0 {
            return Err(("Expected hex digit or \"?\".", parser.toks.current_span()).into());
        } else if first_range_length > 6 {
            return Err(("Expected at most 6 digits.", parser.toks.span_from(start)).into());
        }

        if !has_question_mark && parser.scan_char('-') {
            let mut second_range_length = 0;
            while let Some(tok) = parser.toks.peek() {
                if !tok.kind.is_ascii_hexdigit() {
                    break;
                }
                parser.toks.next();
                second_range_length += 1;
            }

            if second_range_length == 0 {
                return Err(("Expected hex digit.", parser.toks.current_span()).into());
            } else if second_range_length > 6 {
                return Err(("Expected at most 6 digits.", parser.toks.span_from(start)).into());
            }
        }

        let span = parser.toks.span_from(start);

        Ok(AstExpr::String(
            StringExpr(
                Interpolation::new_plain(parser.toks.raw_text(start)),
                QuoteKind::None,
            ),
            span,
        )
        .span(span))
    }

    /// Functions whose arguments are plain CSS rather than SassScript are
    /// captured verbatim (with interpolation still recognized) as unquoted
    /// strings.
    fn try_parse_special_function(
        &mut self,
        parser: &mut StylesheetParser,
        name: &str,
        lower: &str,
        start: usize,
    ) -> SassResult<Option<Spanned<AstExpr>>> {
        let normalized = unvendor(lower);

        let mut buffer;

        match normalized {
            "calc" | "element" | "expression" => {
                if !parser.scan_char('(') {
                    return Ok(None);
                }

                buffer = Interpolation::new_plain(name.to_owned());
                buffer.add_char('(');
            }
            "progid" => {
                if !parser.scan_char(':') {
                    return Ok(None);
                }

                buffer = Interpolation::new_plain(name.to_owned());
                buffer.add_char(':');

                while let Some(tok) = parser.toks.peek() {
                    if !tok.kind.is_alphabetic() && tok.kind != '.' {
                        break;
                    }
                    buffer.add_char(tok.kind);
                    parser.toks.next();
                }

                parser.expect_char('(')?;
                buffer.add_char('(');
            }
            "url" => {
                return Ok(match parser.try_url_contents(None)? {
                    Some(contents) => {
                        let span = parser.toks.span_from(start);
                        Some(
                            AstExpr::String(StringExpr(contents, QuoteKind::None), span)
                                .span(span),
                        )
                    }
                    None => None,
                });
            }
            _ => return Ok(None),
        }

        buffer.add_interpolation(parser.parse_interpolated_declaration_value(false, true, true)?);
        parser.expect_char(')')?;
        buffer.add_char(')');

        let span = parser.toks.span_from(start);

        Ok(Some(
            AstExpr::String(StringExpr(buffer, QuoteKind::None), span).span(span),
        ))
    }

    fn reset_state(&mut self, parser: &mut StylesheetParser) -> SassResult<()> {
        self.comma_expressions = None;
        self.space_expressions = None;
        self.binary_operators = None;
        self.operands = None;
        parser.toks.set_cursor(self.start);
        self.allow_slash = true;
        self.single_expression = Some(self.parse_single_expression(parser)?);

        Ok(())
    }
}

fn is_hex_color(interpolation: &Interpolation) -> bool {
    if let Some(plain) = interpolation.as_plain() {
        if ![3, 4, 6, 8].contains(&plain.len()) {
            return false;
        }

        return plain.chars().all(|c| c.is_ascii_hexdigit());
    }

    false
}
