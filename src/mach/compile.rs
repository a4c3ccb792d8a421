use super::function::Builtins;
use super::program::constant;
use super::{Code, Opcode, Stack, UserFunction, Val};
use crate::error;
use crate::lang::ast::{self, BinaryOp, Command, Expression, Reference, UnaryOp};
use crate::lang::{Dialect, Error, Ident, Label};
use std::rc::Rc;

type Result<T> = std::result::Result<T, Error>;

/// Compiles one statement. Errors carry the statement's location.
pub fn compile(dialect: &Dialect, builtins: &Builtins, statement: &ast::Statement) -> Result<Code> {
    Compiler::new(dialect, builtins)
        .statement(statement)
        .map_err(|e| e.in_location(&statement.loc))
}

/// Code that dimensions each array of a DIM statement. Names the
/// dialect treats as plain strings produce nothing.
pub fn compile_dim(
    dialect: &Dialect,
    builtins: &Builtins,
    statement: &ast::Statement,
) -> Result<Vec<Code>> {
    let comp = Compiler::new(dialect, builtins);
    let mut codes = vec![];
    if let Command::Dim { args } = &statement.command {
        for arg in args {
            let mut prog = Stack::new("COMPILED STATEMENT TOO LARGE");
            if comp.dim(&mut prog, arg).map_err(|e| e.in_location(&statement.loc))? {
                codes.push(prog.into_vec().into());
            }
        }
    }
    Ok(codes)
}

#[derive(Clone, Copy, Default)]
struct ExprOptions<'a> {
    /// Only literals are accepted.
    is_const: bool,
    /// DEF parameters in scope.
    locals: &'a [Rc<str>],
}

struct Compiler<'a> {
    dialect: &'a Dialect,
    builtins: &'a Builtins,
}

impl<'a> Compiler<'a> {
    fn new(dialect: &'a Dialect, builtins: &'a Builtins) -> Compiler<'a> {
        Compiler { dialect, builtins }
    }

    fn expression(
        &self,
        prog: &mut Stack<Opcode>,
        expr: &Expression,
        opts: ExprOptions,
    ) -> Result<()> {
        match expr {
            Expression::Literal { value } => prog.push(Opcode::Literal(Val::from(value))),
            Expression::Reference(r) => self.reference(prog, r, opts),
            Expression::Binary { op, left, right } => {
                self.expression(prog, left, opts)?;
                self.expression(prog, right, opts)?;
                prog.push(binary_opcode(*op))
            }
            Expression::Unary { op, expr } => {
                self.expression(prog, expr, opts)?;
                prog.push(match op {
                    UnaryOp::Neg => Opcode::Neg,
                    UnaryOp::LNot => Opcode::Not,
                    UnaryOp::BNot => Opcode::BitNot,
                })
            }
        }
    }

    fn reference(&self, prog: &mut Stack<Opcode>, r: &Reference, opts: ExprOptions) -> Result<()> {
        let ident = Ident::new(&r.name);
        if r.args.is_none() {
            if let Some(idx) = opts.locals.iter().position(|l| l == ident.name()) {
                return prog.push(Opcode::Local(idx));
            }
        }
        if opts.is_const {
            return Err(error!(SyntaxError; "EXPECTED A CONSTANT"));
        }
        let args = r.args.as_deref().unwrap_or(&[]);
        for arg in args {
            self.expression(prog, arg, opts)?;
        }
        let len = args.len();
        if ident.is_user_function() {
            return prog.push(Opcode::Fn(ident.name().clone(), len));
        }
        if let Some((builtin, arity)) = self.builtins.get(ident.name()) {
            if !arity.contains(&len) {
                return Err(error!(SyntaxError; format!(
                    "WRONG NUMBER OF ARGUMENTS FOR {}",
                    ident
                )));
            }
            return prog.push(Opcode::Builtin(builtin, len));
        }
        match r.args {
            Some(_) if self.is_char_array(&ident) => prog.push(Opcode::PushSlice(ident, len)),
            Some(_) => prog.push(Opcode::PushArr(ident, len)),
            None => prog.push(Opcode::Push(ident)),
        }
    }

    /// Index code followed by the store opcode. The value to store must
    /// already be on the stack when this runs.
    fn lvalue(&self, prog: &mut Stack<Opcode>, r: &Reference) -> Result<()> {
        let ident = Ident::new(&r.name);
        if ident.is_user_function() || self.builtins.contains(ident.name()) {
            return Err(error!(SyntaxError; format!("CAN'T ASSIGN TO FUNCTION {}", ident)));
        }
        match &r.args {
            Some(args) => {
                for arg in args {
                    self.expression(prog, arg, ExprOptions::default())?;
                }
                if self.is_char_array(&ident) {
                    prog.push(Opcode::PopSlice(ident, args.len()))
                } else {
                    prog.push(Opcode::PopArr(ident, args.len()))
                }
            }
            None => prog.push(Opcode::Pop(ident)),
        }
    }

    fn is_char_array(&self, ident: &Ident) -> bool {
        self.dialect.arrays_contain_chars && ident.is_string()
    }

    /// Returns false when there is nothing to dimension.
    fn dim(&self, prog: &mut Stack<Opcode>, r: &Reference) -> Result<bool> {
        let ident = Ident::new(&r.name);
        if self.is_char_array(&ident) {
            return Ok(false);
        }
        let args = r.args.as_deref().unwrap_or(&[]);
        let opts = ExprOptions {
            is_const: self.dialect.static_arrays,
            ..ExprOptions::default()
        };
        for arg in args {
            self.expression(prog, arg, opts)?;
        }
        prog.push(Opcode::DimArr(ident, args.len()))?;
        Ok(true)
    }

    fn statement(&self, statement: &ast::Statement) -> Result<Code> {
        let mut prog: Stack<Opcode> = Stack::new("COMPILED STATEMENT TOO LARGE");
        match &statement.command {
            Command::Let { lexpr, right } => self.r#let(&mut prog, lexpr, right)?,
            Command::Print { args } => self.r#print(&mut prog, args)?,
            Command::Input { prompt, args } => self.r#input(&mut prog, prompt.as_ref(), args)?,
            Command::Get { lexpr } => self.r#get(&mut prog, lexpr)?,
            Command::For {
                lexpr,
                initial,
                target,
                step,
            } => self.r#for(&mut prog, lexpr, initial, target, step.as_ref())?,
            Command::Next { lexpr } => self.r#next(&mut prog, lexpr.as_ref())?,
            Command::If { cond } => {
                self.expression(&mut prog, cond, ExprOptions::default())?;
                prog.push(Opcode::IfNot)?;
            }
            Command::Else => prog.push(Opcode::Else)?,
            Command::While { cond } => {
                self.expression(&mut prog, cond, ExprOptions::default())?;
                prog.push(Opcode::While)?;
            }
            Command::Wend => prog.push(Opcode::Wend)?,
            Command::Goto { label } => {
                self.expression(&mut prog, label, ExprOptions::default())?;
                prog.push(Opcode::Goto)?;
            }
            Command::Gosub { label } => {
                self.expression(&mut prog, label, ExprOptions::default())?;
                prog.push(Opcode::Gosub)?;
            }
            Command::Return => prog.push(Opcode::Return)?,
            Command::OnGoto { expr, labels } => self.r#on(&mut prog, expr, labels, false)?,
            Command::OnGosub { expr, labels } => self.r#on(&mut prog, expr, labels, true)?,
            Command::Def { lexpr, def } => self.r#def(&mut prog, lexpr, def)?,
            Command::Dim { args } => {
                if !self.dialect.static_arrays {
                    for arg in args {
                        self.dim(&mut prog, arg)?;
                    }
                }
            }
            Command::Data { .. } | Command::Option => {}
            Command::Read { args } => {
                for arg in args {
                    prog.push(Opcode::Read(Ident::new(&arg.name)))?;
                    self.lvalue(&mut prog, arg)?;
                }
            }
            Command::Restore { label } => {
                let label = match label {
                    Some(expr) => Some(const_label(expr)?),
                    None => None,
                };
                prog.push(Opcode::Restore(label))?;
            }
            Command::End | Command::Stop => prog.push(Opcode::End)?,
            Command::Pop => prog.push(Opcode::PopReturn)?,
            Command::Clear => prog.push(Opcode::Clear)?,
            Command::Randomize => prog.push(Opcode::Randomize)?,
            Command::Unknown => return Err(error!(UnknownStatement)),
        }
        Ok(prog.into_vec().into())
    }

    fn r#let(&self, prog: &mut Stack<Opcode>, lexpr: &Reference, right: &Expression) -> Result<()> {
        self.expression(prog, right, ExprOptions::default())?;
        self.lvalue(prog, lexpr)
    }

    fn r#print(&self, prog: &mut Stack<Opcode>, args: &[Expression]) -> Result<()> {
        for arg in args {
            self.expression(prog, arg, ExprOptions::default())?;
            prog.push(Opcode::Print)?;
        }
        Ok(())
    }

    fn r#input(
        &self,
        prog: &mut Stack<Opcode>,
        prompt: Option<&Expression>,
        args: &[Reference],
    ) -> Result<()> {
        match prompt {
            Some(expr) => self.expression(prog, expr, ExprOptions::default())?,
            None => prog.push(Opcode::Literal(Val::from("")))?,
        }
        prog.push(Opcode::Input(args.len()))?;
        for arg in args {
            prog.push(Opcode::InputValue(Ident::new(&arg.name)))?;
            self.lvalue(prog, arg)?;
        }
        Ok(())
    }

    fn r#get(&self, prog: &mut Stack<Opcode>, lexpr: &Reference) -> Result<()> {
        prog.push(Opcode::Get)?;
        prog.push(Opcode::InputValue(Ident::new(&lexpr.name)))?;
        self.lvalue(prog, lexpr)
    }

    fn r#for(
        &self,
        prog: &mut Stack<Opcode>,
        lexpr: &Reference,
        initial: &Expression,
        target: &Expression,
        step: Option<&Expression>,
    ) -> Result<()> {
        let ident = Ident::new(&lexpr.name);
        if lexpr.args.is_some() || ident.is_string() {
            return Err(error!(SyntaxError; "FOR NEEDS A NUMERIC VARIABLE"));
        }
        if ident.is_user_function() || self.builtins.contains(ident.name()) {
            return Err(error!(SyntaxError; format!("CAN'T ASSIGN TO FUNCTION {}", ident)));
        }
        self.expression(prog, initial, ExprOptions::default())?;
        self.expression(prog, target, ExprOptions::default())?;
        if let Some(step) = step {
            self.expression(prog, step, ExprOptions::default())?;
        }
        prog.push(Opcode::For(ident, step.is_some()))
    }

    fn r#next(&self, prog: &mut Stack<Opcode>, lexpr: Option<&Reference>) -> Result<()> {
        prog.push(Opcode::Next(lexpr.map(|r| Ident::new(&r.name))))
    }

    fn r#on(
        &self,
        prog: &mut Stack<Opcode>,
        expr: &Expression,
        labels: &[Expression],
        is_gosub: bool,
    ) -> Result<()> {
        self.expression(prog, expr, ExprOptions::default())?;
        let labels = labels
            .iter()
            .map(const_label)
            .collect::<Result<Vec<Label>>>()?;
        prog.push(Opcode::On(labels.into(), is_gosub))
    }

    fn r#def(&self, prog: &mut Stack<Opcode>, lexpr: &Reference, def: &Expression) -> Result<()> {
        let mut params: Vec<Rc<str>> = vec![];
        for arg in lexpr.args.as_deref().unwrap_or(&[]) {
            match arg {
                Expression::Reference(Reference { name, args: None }) => {
                    params.push(Ident::new(name).name().clone())
                }
                _ => return Err(error!(SyntaxError; "DEF ARGUMENTS MUST BE VARIABLE NAMES")),
            }
        }
        let mut body: Stack<Opcode> = Stack::new("COMPILED FUNCTION TOO LARGE");
        let opts = ExprOptions {
            locals: &params,
            ..ExprOptions::default()
        };
        self.expression(&mut body, def, opts)?;
        let function = UserFunction {
            params: params.clone(),
            code: body.into_vec().into(),
        };
        let name = Ident::new(&lexpr.name).name().clone();
        prog.push(Opcode::DefFn(name, Rc::new(function)))
    }
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::Add,
        BinaryOp::Sub => Opcode::Sub,
        BinaryOp::Mul => Opcode::Mul,
        BinaryOp::Div => Opcode::Div,
        BinaryOp::IDiv => Opcode::DivInt,
        BinaryOp::Mod => Opcode::Mod,
        BinaryOp::Pow => Opcode::Pow,
        BinaryOp::Eq => Opcode::Eq,
        BinaryOp::Ne => Opcode::NotEq,
        BinaryOp::Lt => Opcode::Lt,
        BinaryOp::Gt => Opcode::Gt,
        BinaryOp::Le => Opcode::LtEq,
        BinaryOp::Ge => Opcode::GtEq,
        BinaryOp::LAnd => Opcode::And,
        BinaryOp::LOr => Opcode::Or,
        BinaryOp::BAnd => Opcode::BitAnd,
        BinaryOp::BOr => Opcode::BitOr,
        BinaryOp::BXor => Opcode::BitXor,
        BinaryOp::BImp => Opcode::Imp,
        BinaryOp::BEqv => Opcode::Eqv,
        BinaryOp::Min => Opcode::Min,
        BinaryOp::Max => Opcode::Max,
    }
}

fn const_label(expr: &Expression) -> Result<Label> {
    Ok(constant(expr)?.to_label())
}
