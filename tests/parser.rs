#[cfg(test)]
mod parser_tests {
    use rox::ast_printer::AstPrinter;
    use rox::parser::Parser;
    use rox::scanner::Scanner;

    /// Parse `source` and return (printed statements, rendered errors).
    fn parse(source: &str) -> (Vec<String>, Vec<String>) {
        let (tokens, lex_errors) = Scanner::new(source).scan_all();
        assert!(lex_errors.is_empty(), "unexpected lex errors: {:?}", lex_errors);

        let (statements, errors) = Parser::new(tokens).parse();

        (
            statements.iter().map(AstPrinter::print_stmt).collect(),
            errors.iter().map(|e| e.to_string()).collect(),
        )
    }

    fn assert_parses_to(source: &str, expected: &[&str]) {
        let (statements, errors) = parse(source);

        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        assert_eq!(statements, expected);
    }

    #[test]
    fn test_precedence_and_associativity() {
        assert_parses_to(
            "print -1 + 2 * 3 == 7; 1 - 2 - 3; !!true;",
            &[
                "(print (== (+ (- 1.0) (* 2.0 3.0)) 7.0))",
                "(; (- (- 1.0 2.0) 3.0))",
                "(; (! (! true)))",
            ],
        );
    }

    #[test]
    fn test_grouping_and_literals() {
        assert_parses_to(
            "(1 + 2) * 3; print \"hi\"; nil; false;",
            &[
                "(; (* (group (+ 1.0 2.0)) 3.0))",
                "(print hi)",
                "(; nil)",
                "(; false)",
            ],
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_parses_to("a or b and c;", &["(; (or a (and b c)))"]);
    }

    #[test]
    fn test_assignment_is_right_associative() {
        assert_parses_to(
            "a = b = 1; a.b.c = 2;",
            &["(; (= a (= b 1.0)))", "(; (.= (. a b) c 2.0))"],
        );
    }

    #[test]
    fn test_calls_chain() {
        assert_parses_to(
            "f(1)(2); obj.method(a, b);",
            &[
                "(; (call (call f 1.0) 2.0))",
                "(; (call (. obj method) a b))",
            ],
        );
    }

    #[test]
    fn test_declarations() {
        assert_parses_to(
            "var x; var y = 2; fun add(a, b) { return a + b; } fun noop() { return; }",
            &[
                "(var x)",
                "(var y 2.0)",
                "(fun add (a b) (return (+ a b)))",
                "(fun noop () (return))",
            ],
        );
    }

    #[test]
    fn test_class_declaration() {
        assert_parses_to(
            "class B < A { init(x) { this.x = x; } m() { return super.m(); } }",
            &["(class B < A (fun init (x) (; (.= this x x))) (fun m () (return (call (super m)))))"],
        );
    }

    #[test]
    fn test_control_flow() {
        assert_parses_to(
            "if (a) print 1; else { print 2; } while (x < 3) x = x + 1;",
            &[
                "(if a (print 1.0) (block (print 2.0)))",
                "(while (< x 3.0) (; (= x (+ x 1.0))))",
            ],
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_parses_to(
            "for (var i = 0; i < 3; i = i + 1) print i;",
            &["(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"],
        );
    }

    #[test]
    fn test_for_without_clauses() {
        assert_parses_to("for (;;) print 1;", &["(while true (print 1.0))"]);
    }

    #[test]
    fn test_expect_variable_name() {
        let (_, errors) = parse("print 1;\nvar 3;");

        assert_eq!(errors, vec!["[line 2] Error at '3': Expect variable name."]);
    }

    #[test]
    fn test_error_at_end() {
        let (_, errors) = parse("print 1");

        assert_eq!(errors, vec!["[line 1] Error at end: Expect ';' after value."]);
    }

    #[test]
    fn test_expect_expression() {
        let (_, errors) = parse(");");

        assert_eq!(errors, vec!["[line 1] Error at ')': Expect expression."]);
    }

    #[test]
    fn test_invalid_assignment_target_does_not_unwind() {
        let (statements, errors) = parse("1 + 2 = 3; print 4;");

        assert_eq!(errors, vec!["[line 1] Error at '=': Invalid assignment target."]);
        assert_eq!(statements, vec!["(; (+ 1.0 2.0))", "(print 4.0)"]);
    }

    #[test]
    fn test_recovery_reports_every_error() {
        let (statements, errors) = parse("var = 1;\nprint 2;\nfun (;\nprint 3;");

        assert_eq!(
            errors,
            vec![
                "[line 1] Error at '=': Expect variable name.",
                "[line 3] Error at '(': Expect function name.",
            ]
        );
        assert_eq!(statements, vec!["(print 2.0)", "(print 3.0)"]);
    }

    #[test]
    fn test_super_requires_method() {
        let (_, errors) = parse("class A < B { m() { super; } }");

        assert_eq!(errors[0], "[line 1] Error at ';': Expect '.' after 'super'.");
    }

    #[test]
    fn test_too_many_arguments_is_reported() {
        let args: Vec<String> = (0..256).map(|i| i.to_string()).collect();
        let source = format!("f({});", args.join(", "));

        let (statements, errors) = parse(&source);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].ends_with("Can't have more than 255 arguments."));

        // The call itself still parses.
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn test_too_many_parameters_is_reported() {
        let params: Vec<String> = (0..256).map(|i| format!("p{}", i)).collect();
        let source = format!("fun f({}) {{}}", params.join(", "));

        let (_, errors) = parse(&source);

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            "[line 1] Error at 'p255': Can't have more than 255 parameters."
        );
    }
}
