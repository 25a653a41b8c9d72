//! Canonical source printer for Axenlang ASTs
//!
//! Prints a parsed tree back to source text in one fixed layout. Parentheses
//! appear exactly where the tree has a `Grouped` node; the parser already
//! encodes all other precedence structurally, so printing then reparsing is
//! structurally stable.

use crate::frontend::ast::*;

/// Render a source file in canonical form
pub fn unparse(file: &SourceFile) -> String {
    let mut printer = Printer::default();
    for decl in &file.decls {
        printer.write_decl(decl);
    }
    printer.out
}

#[derive(Default)]
struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn push_indent(&mut self) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn write_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Import(d) => {
                self.out.push_str("import \"");
                self.out.push_str(&d.path);
                self.out.push_str("\";\n");
            }
            Decl::Typedef(d) => {
                self.out.push_str("typedef ");
                self.out.push_str(&d.alias.name);
                self.out.push(' ');
                self.write_type(&d.target);
                self.out.push_str(";\n");
            }
            Decl::Intdef(d) => {
                self.out.push_str("intdef ");
                self.out.push_str(&d.alias.name);
                self.out.push(' ');
                self.write_int(&d.value);
                self.out.push_str(";\n");
            }
            Decl::Class(d) => {
                self.out.push_str("class ");
                self.out.push_str(&d.name.name);
                self.out.push_str(" {\n");
                self.indent += 1;
                for member in &d.members {
                    match member {
                        Member::Field(f) => {
                            self.push_indent();
                            self.write_type(&f.ty);
                            self.out.push(' ');
                            self.out.push_str(&f.name.name);
                            self.out.push_str(";\n");
                        }
                        Member::Method(m) => {
                            self.write_signature(&m.ret_type, &m.name, &m.params, &m.body);
                        }
                    }
                }
                self.indent -= 1;
                self.out.push_str("}\n");
            }
            Decl::Function(d) => {
                self.write_signature(&d.ret_type, &d.name, &d.params, &d.body);
            }
        }
    }

    fn write_signature(
        &mut self,
        ret_type: &Type,
        name: &Ident,
        params: &[Param],
        body: &Option<Block>,
    ) {
        self.push_indent();
        self.write_type(ret_type);
        self.out.push(' ');
        self.out.push_str(&name.name);
        self.out.push('(');
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.write_type(&param.ty);
            self.out.push(' ');
            self.out.push_str(&param.name.name);
        }
        self.out.push(')');
        match body {
            Some(block) => {
                self.out.push(' ');
                self.write_block(block);
                self.out.push('\n');
            }
            None => self.out.push_str(";\n"),
        }
    }

    fn write_type(&mut self, ty: &Type) {
        match ty {
            Type::Primitive(kind, _) => self.out.push_str(kind.keyword()),
            Type::Pointer(target, _) => {
                self.out.push_str("ptr ");
                self.write_type(target);
            }
            Type::FunctionPointer { ret, params, .. } => {
                self.out.push_str("ptr ");
                self.write_type(ret);
                self.out.push('(');
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.write_type(param);
                }
                self.out.push(')');
            }
            Type::Array { elem, len, .. } => {
                self.write_type(elem);
                self.out.push('[');
                self.write_int(len);
                self.out.push(']');
            }
            Type::ClassRef(ident) => self.out.push_str(&ident.name),
        }
    }

    fn write_block(&mut self, block: &Block) {
        self.out.push_str("{\n");
        self.indent += 1;
        for stmt in &block.stmts {
            self.write_stmt(stmt);
        }
        self.indent -= 1;
        self.push_indent();
        self.out.push('}');
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        self.push_indent();
        match stmt {
            Stmt::VarDecl { ty, name, init, .. } => {
                self.write_type(ty);
                self.out.push(' ');
                self.out.push_str(&name.name);
                if let Some(init) = init {
                    self.out.push_str(" = ");
                    self.write_expr(init);
                }
                self.out.push(';');
            }
            Stmt::Assign { target, value, .. } => {
                self.write_expr(target);
                self.out.push_str(" = ");
                self.write_expr(value);
                self.out.push(';');
            }
            Stmt::Return { value, .. } => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.write_expr(value);
                }
                self.out.push(';');
            }
            Stmt::If { cond, then_block, else_block, .. } => {
                self.out.push_str("if (");
                self.write_expr(cond);
                self.out.push_str(") ");
                self.write_block(then_block);
                if let Some(else_block) = else_block {
                    self.out.push_str(" else ");
                    self.write_block(else_block);
                }
            }
            Stmt::While { cond, body, .. } => {
                self.out.push_str("while (");
                self.write_expr(cond);
                self.out.push_str(") ");
                self.write_block(body);
            }
            Stmt::Expr(expr) => {
                self.write_expr(expr);
                self.out.push(';');
            }
            Stmt::Block(block) => self.write_block(block),
        }
        self.out.push('\n');
    }

    fn write_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Int(lit) => self.write_int(lit),
            Expr::Float { value, unsigned, .. } => {
                let mut text = format!("{}", value);
                // the literal form requires digits on both sides of the dot
                if !text.contains('.') {
                    text.push_str(".0");
                }
                self.out.push_str(&text);
                if *unsigned {
                    self.out.push('u');
                }
            }
            Expr::Str { value, .. } => {
                self.out.push('"');
                self.out.push_str(value);
                self.out.push('"');
            }
            Expr::Nullptr { .. } => self.out.push_str("nullptr"),
            Expr::Var(ident) => self.out.push_str(&ident.name),
            Expr::Call { callee, args, .. } => {
                self.out.push_str(&callee.name);
                self.out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.write_expr(arg);
                }
                self.out.push(')');
            }
            Expr::Field { object, field, .. } => {
                self.write_expr(object);
                self.out.push('.');
                self.out.push_str(&field.name);
            }
            Expr::Index { base, index, .. } => {
                self.write_expr(base);
                self.out.push('[');
                self.write_expr(index);
                self.out.push(']');
            }
            Expr::Deref { operand, .. } => {
                self.out.push('$');
                self.write_expr(operand);
            }
            Expr::AddressOf { operand, .. } => {
                self.out.push('&');
                self.write_expr(operand);
            }
            Expr::Binary { op, left, right, .. } => {
                self.write_expr(left);
                self.out.push(' ');
                self.out.push_str(op.symbol());
                self.out.push(' ');
                self.write_expr(right);
            }
            Expr::Grouped { inner, .. } => {
                self.out.push('(');
                self.write_expr(inner);
                self.out.push(')');
            }
        }
    }

    fn write_int(&mut self, lit: &IntLit) {
        self.out.push_str(&lit.value.to_string());
        if lit.unsigned {
            self.out.push('u');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse;
    use pretty_assertions::assert_eq;

    /// Print, reparse, print again: the canonical form must be a fixed point,
    /// and the two reparses must agree structurally (spans included, since
    /// both come from the same text).
    fn assert_round_trip(source: &str) {
        let first = parse(source);
        assert!(first.diagnostics.is_empty(), "{:?}", first.diagnostics);

        let canonical = unparse(&first.file);
        let second = parse(&canonical);
        assert!(second.diagnostics.is_empty(), "reparse failed: {:?}\n{}", second.diagnostics, canonical);

        let canonical_again = unparse(&second.file);
        assert_eq!(canonical, canonical_again);

        let third = parse(&canonical_again);
        assert_eq!(second.file, third.file);
    }

    #[test]
    fn test_round_trip_full_program() {
        assert_round_trip(
            r#"
            import "core/mem";
            typedef Callback ptr void(int, ptr char);
            typedef Word uint;
            intdef BufSize 256;
            class Buffer {
                ptr char data;
                uint len;
                uint capacity();
                void grow(uint by) {
                    len = len + by;
                }
            }
            int checksum(ptr uchar bytes, uint n);
            int main() {
                ptr int[4] slots;
                int acc = 0;
                uint mask = 0xFFu;
                float ratio = 2.5;
                if (acc < 10) {
                    acc = acc + 1;
                } else {
                    acc = acc % 3;
                }
                while (acc > 0) {
                    slots[0] = &acc;
                    $slots[1] = acc * (acc - 1);
                    acc = acc - 1;
                }
                log("done\n", acc.value, nullptr);
                return acc;
            }
            "#,
        );
    }

    #[test]
    fn test_round_trip_keeps_grouping() {
        let result = parse("int f() { return (1 + 2) * 3; }");
        let canonical = unparse(&result.file);
        assert!(canonical.contains("(1 + 2) * 3"));
        let reparsed = parse(&canonical);
        let Decl::Function(f) = &reparsed.file.decls[0] else {
            panic!("expected function");
        };
        assert!(matches!(
            f.body.as_ref().unwrap().stmts[0],
            Stmt::Return { value: Some(Expr::Binary { op: BinOp::Mul, ref left, .. }), .. }
                if matches!(**left, Expr::Grouped { .. })
        ));
    }

    #[test]
    fn test_hex_prints_canonical_decimal() {
        let result = parse("intdef Mask 0xFFu;");
        assert_eq!(unparse(&result.file), "intdef Mask 255u;\n");
    }

    #[test]
    fn test_float_always_has_fraction() {
        // 4.0 must not print as `4`, which would re-lex as an integer
        let result = parse("int f() { float x = 4.0; return 0; }");
        let canonical = unparse(&result.file);
        assert!(canonical.contains("float x = 4.0;"));
        assert_round_trip("int f() { float x = 4.0; return 0; }");
    }

    #[test]
    fn test_string_escapes_survive() {
        assert_round_trip(r#"int f() { print("tab\there \"quoted\""); return 0; }"#);
    }

    #[test]
    fn test_prototype_prints_semicolon() {
        let result = parse("void handler(int code);");
        assert_eq!(unparse(&result.file), "void handler(int code);\n");
    }
}
