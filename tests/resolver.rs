#[cfg(test)]
mod resolver_tests {
    use rox::interpreter::Interpreter;
    use rox::parser::Parser;
    use rox::resolver::Resolver;
    use rox::scanner::Scanner;

    /// Resolve `source`, returning the rendered static errors.
    fn resolve(source: &str) -> Vec<String> {
        let (tokens, _) = Scanner::new(source).scan_all();
        let (statements, parse_errors) = Parser::new(tokens).parse();
        assert!(parse_errors.is_empty(), "unexpected parse errors: {:?}", parse_errors);

        let mut interpreter = Interpreter::with_output(Box::new(std::io::sink()));

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => Vec::new(),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    #[test]
    fn test_valid_program_has_no_errors() {
        let errors = resolve(
            "var a = 1;
             fun f(x) { var y = x; return y + a; }
             class A { init() { this.v = 1; } get() { return this.v; } }
             class B < A { get() { return super.get(); } }",
        );

        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_top_level_return() {
        assert_eq!(
            resolve("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
    }

    #[test]
    fn test_return_value_from_initializer() {
        assert_eq!(
            resolve("class A {\n  init() { return 1; }\n}"),
            vec!["[line 2] Error at 'return': Can't return a value from an initializer."]
        );
    }

    #[test]
    fn test_bare_return_in_initializer_is_fine() {
        assert!(resolve("class A { init() { return; } }").is_empty());
    }

    #[test]
    fn test_class_inherits_from_itself() {
        assert_eq!(
            resolve("class Oops < Oops {}"),
            vec!["[line 1] Error at 'Oops': A class can't inherit from itself."]
        );
    }

    #[test]
    fn test_this_outside_class() {
        assert_eq!(
            resolve("print this;"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
        assert_eq!(
            resolve("fun f() { return this; }"),
            vec!["[line 1] Error at 'this': Can't use 'this' outside of a class."]
        );
    }

    #[test]
    fn test_super_outside_class() {
        assert_eq!(
            resolve("super.m();"),
            vec!["[line 1] Error at 'super': Can't use 'super' outside of a class."]
        );
    }

    #[test]
    fn test_super_without_superclass() {
        assert_eq!(
            resolve("class A { m() { super.m(); } }"),
            vec!["[line 1] Error at 'super': Can't use 'super' in a class with no superclass."]
        );
    }

    #[test]
    fn test_read_local_in_own_initializer() {
        assert_eq!(
            resolve("{ var a = a; }"),
            vec!["[line 1] Error at 'a': Can't read local variable in its own initializer."]
        );
    }

    #[test]
    fn test_global_self_reference_is_allowed() {
        assert!(resolve("var a = a;").is_empty());
    }

    #[test]
    fn test_redeclaration_in_local_scope() {
        assert_eq!(
            resolve("fun f() {\n  var a = 1;\n  var a = 2;\n}"),
            vec!["[line 3] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            resolve("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
    }

    #[test]
    fn test_global_redeclaration_is_allowed() {
        assert!(resolve("var a = 1; var a = 2;").is_empty());
    }

    #[test]
    fn test_all_errors_are_collected() {
        let errors = resolve("return;\nprint this;\n{ var b = b; }");

        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("[line 1]"));
        assert!(errors[1].starts_with("[line 2]"));
        assert!(errors[2].starts_with("[line 3]"));
    }
}
