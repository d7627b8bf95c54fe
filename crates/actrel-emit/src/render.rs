//! Serializer: a [`Module`] as relational specification text.
//!
//! Layout: header comment, `module` and `open` lines, signatures sorted by
//! name (each followed by its appended fact block), the remaining facts, the
//! referenced local predicates and functions, and the run command. Rendering
//! reads the module only, so the same module always yields the same text.

use std::collections::HashMap;

use actrel_model::{Command, Expr, FuncDecl, FuncKind, FuncRef, Module, QuantKind, Signature};

/// Render a whole module.
pub fn render_module(module: &Module) -> String {
    let renderer = Renderer { module };
    let (signature_facts, global_facts) = renderer.split_facts();

    let mut lines = vec![
        format!("// Generated by actrel from {}.", module.name()),
        String::new(),
        format!("module {}", module.name()),
    ];
    for import in module.imports() {
        lines.push(format!("open {import}"));
    }

    let mut signatures: Vec<&Signature> = module.signatures().iter().collect();
    signatures.sort_by(|a, b| a.name.cmp(&b.name));
    for sig in signatures {
        lines.push(String::new());
        let facts = signature_facts
            .get(sig.name.as_str())
            .map(Vec::as_slice)
            .unwrap_or_default();
        lines.extend(renderer.signature(sig, facts));
    }

    if !global_facts.is_empty() {
        lines.push(String::new());
        lines.push("fact {".to_string());
        for fact in global_facts {
            lines.push(format!("\t{}", renderer.expr(fact, None)));
        }
        lines.push("}".to_string());
    }

    for decl in renderer.local_functions() {
        lines.push(String::new());
        lines.push(renderer.function(decl));
    }

    if let Some(command) = module.command() {
        lines.push(String::new());
        lines.push(renderer.command(command));
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Render one expression in the context of `module`, which resolves call names.
pub fn render_expr(module: &Module, expr: &Expr) -> String {
    Renderer { module }.expr(expr, None)
}

/// Facts quantified over one signature: bound variable and body.
type SignatureFacts<'m> = HashMap<&'m str, Vec<(&'m str, &'m Expr)>>;

struct Renderer<'m> {
    module: &'m Module,
}

impl<'m> Renderer<'m> {
    /// Separate `all v: Sig | body` conjuncts over declared signatures from
    /// everything else.
    fn split_facts(&self) -> (SignatureFacts<'m>, Vec<&'m Expr>) {
        let mut by_signature: SignatureFacts<'m> = HashMap::new();
        let mut global = Vec::new();
        let Some(fact) = self.module.fact() else {
            return (by_signature, global);
        };
        for conjunct in fact.conjuncts() {
            match conjunct {
                Expr::Quantifier {
                    kind: QuantKind::All,
                    var,
                    domain,
                    body,
                } if self.module.signature(domain).is_some() => {
                    by_signature
                        .entry(domain.as_str())
                        .or_default()
                        .push((var.as_str(), body.as_ref()));
                }
                other => global.push(other),
            }
        }
        (by_signature, global)
    }

    fn signature(&self, sig: &Signature, facts: &[(&str, &Expr)]) -> Vec<String> {
        let mut head = String::new();
        if sig.is_abstract {
            head.push_str("abstract ");
        }
        head.push_str("sig ");
        head.push_str(&sig.name);
        if let Some(parent) = &sig.parent {
            head.push_str(" extends ");
            head.push_str(parent);
        }

        let groups = field_groups(sig);
        let mut lines = Vec::new();
        if groups.is_empty() {
            lines.push(format!("{head} {{}}"));
        } else {
            lines.push(format!("{head} {{"));
            let last = groups.len() - 1;
            for (i, group) in groups.iter().enumerate() {
                let sep = if i < last { "," } else { "" };
                lines.push(format!("\t{group}{sep}"));
            }
            lines.push("}".to_string());
        }

        if !facts.is_empty() {
            if let Some(closing) = lines.last_mut() {
                closing.push_str(" {");
            }
            for (var, body) in facts {
                for conjunct in body.conjuncts() {
                    lines.push(format!("\t{}", self.expr(conjunct, Some(*var))));
                }
            }
            lines.push("}".to_string());
        }
        lines
    }

    /// Local declarations reachable from the fact and the command, in
    /// first-reference order. Library handles are already declared by the
    /// opened modules.
    fn local_functions(&self) -> Vec<&'m FuncDecl> {
        self.module
            .referenced()
            .into_iter()
            .filter(|func| matches!(func, FuncRef::Local(_)))
            .filter_map(|func| self.module.function(func))
            .collect()
    }

    fn function(&self, decl: &FuncDecl) -> String {
        let params = if decl.params.is_empty() {
            String::new()
        } else {
            let list: Vec<String> = decl
                .params
                .iter()
                .map(|p| format!("{}: {}", p.name, p.type_name))
                .collect();
            format!("[{}]", list.join(", "))
        };
        let body = decl
            .body
            .as_ref()
            .map(|b| self.expr(b, None))
            .unwrap_or_default();
        match decl.kind {
            FuncKind::Pred => format!("pred {}{params} {{{body}}}", decl.name),
            FuncKind::Fun => format!(
                "fun {}{params}: {} {{{body}}}",
                decl.name,
                decl.returns.as_deref().unwrap_or("univ")
            ),
        }
    }

    fn command(&self, command: &Command) -> String {
        let mut line = format!(
            "run {} {{{}}} for {}",
            command.label,
            self.expr(&command.body, None),
            command.scope
        );
        if !command.exact.is_empty() {
            let exact: Vec<String> = command
                .exact
                .iter()
                .map(|(sig, n)| format!("exactly {n} {sig}"))
                .collect();
            line.push_str(" but ");
            line.push_str(&exact.join(", "));
        }
        line
    }

    /// Render `expr`; occurrences of the variable `this_var` print as `this`.
    fn expr(&self, expr: &Expr, this_var: Option<&str>) -> String {
        match expr {
            Expr::Var(name) => match this_var {
                Some(var) if var == name => "this".to_string(),
                _ => name.clone(),
            },
            Expr::Const(n) => n.to_string(),
            Expr::Join(lhs, rhs) => {
                // A bare name after the dot is a field, never the bound variable.
                let rhs_this = match rhs.as_ref() {
                    Expr::Var(_) => None,
                    _ => this_var,
                };
                format!(
                    "{}.{}",
                    self.wrapped(lhs, needs_parens_in_join(lhs), this_var),
                    self.wrapped(rhs, needs_parens_in_join(rhs), rhs_this)
                )
            }
            Expr::Binary(op, lhs, rhs) => {
                let prec = op.precedence();
                let left = match lhs.as_ref() {
                    Expr::Binary(child, ..) => child.precedence() < prec,
                    Expr::Quantifier { .. } => true,
                    _ => false,
                };
                let right = match rhs.as_ref() {
                    Expr::Binary(child, ..) => child.precedence() <= prec,
                    Expr::Quantifier { .. } => true,
                    _ => false,
                };
                format!(
                    "{} {} {}",
                    self.wrapped(lhs, left, this_var),
                    op.token(),
                    self.wrapped(rhs, right, this_var)
                )
            }
            Expr::Unary(op, inner) => {
                let parens = matches!(inner.as_ref(), Expr::Binary(..) | Expr::Quantifier { .. });
                format!("{}{}", op.token(), self.wrapped(inner, parens, this_var))
            }
            Expr::Call(func, args) => {
                let name = self
                    .module
                    .function(*func)
                    .map(|d| d.name.as_str())
                    .unwrap_or("?");
                if args.is_empty() {
                    name.to_string()
                } else {
                    let args: Vec<String> = args.iter().map(|a| self.expr(a, this_var)).collect();
                    format!("{name}[{}]", args.join(", "))
                }
            }
            Expr::Quantifier {
                kind,
                var,
                domain,
                body,
            } => {
                let inner_this = this_var.filter(|v| v != var);
                format!(
                    "{} {var}: {domain} | {}",
                    kind.keyword(),
                    self.expr(body, inner_this)
                )
            }
        }
    }

    fn wrapped(&self, expr: &Expr, parens: bool, this_var: Option<&str>) -> String {
        let text = self.expr(expr, this_var);
        if parens {
            format!("({text})")
        } else {
            text
        }
    }
}

fn needs_parens_in_join(expr: &Expr) -> bool {
    matches!(expr, Expr::Binary(..) | Expr::Quantifier { .. })
}

/// Field declaration lines: one group per target type in order of first
/// appearance, members in declaration order.
fn field_groups(sig: &Signature) -> Vec<String> {
    let mut groups: Vec<(&str, Vec<&actrel_model::Field>)> = Vec::new();
    for field in &sig.fields {
        match groups.iter_mut().find(|(target, _)| *target == field.target) {
            Some((_, members)) => members.push(field),
            None => groups.push((field.target.as_str(), vec![field])),
        }
    }
    groups
        .into_iter()
        .map(|(target, members)| {
            let disj = members.len() > 1 && !members.iter().any(|f| f.is_parameter);
            let names: Vec<&str> = members.iter().map(|f| f.name.as_str()).collect();
            format!(
                "{}{}: set {target}",
                if disj { "disj " } else { "" },
                names.join(", ")
            )
        })
        .collect()
}
