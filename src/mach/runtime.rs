use super::compile::{compile, compile_dim};
use super::flow::{self, ForLoop};
use super::function::{Builtins, Env, Function};
use super::snapshot::{Pending, Snapshot};
use super::val::format_number;
use super::{Address, Code, Opcode, Operation, Program, Rng, Stack, Val, Var};
use crate::error;
use crate::lang::{ast, Dialect, Error, Ident, SourceLocation};
use log::{debug, trace};
use std::collections::VecDeque;

type Result<T> = std::result::Result<T, Error>;

const MAX_RETURNS: usize = 32767;
const MAX_CALL_DEPTH: usize = 256;

/// ## Runtime host
///
/// Where PRINT output goes. `resume` is called once an INPUT has been
/// answered and the machine can be stepped again.

pub trait Host {
    fn print(&mut self, text: &str);
    fn resume(&mut self) {}
}

impl Host for String {
    fn print(&mut self, text: &str) {
        self.push_str(text)
    }
}

struct Quiet;

impl Host for Quiet {
    fn print(&mut self, _text: &str) {}
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Running,
    /// Waiting for `Runtime::input`: prompt and number of values wanted.
    Input(String, usize),
    Stopped,
    Error(Error),
}

enum Flow {
    Next,
    Suspend,
}

struct State {
    pc: Address,
    data_ptr: usize,
    var: Var,
    for_loops: Vec<ForLoop>,
    whiles: Stack<Address>,
    returns: Stack<Address>,
    column: usize,
    rng: Rng,
    running: bool,
    exited: bool,
    pending: Option<Pending>,
}

impl State {
    fn new() -> State {
        State {
            pc: 0,
            data_ptr: 0,
            var: Var::new(),
            for_loops: vec![],
            whiles: Stack::new("WHILE LOOPS NESTED TOO DEEPLY"),
            returns: Stack::with_limit("TOO MANY GOSUBS", MAX_RETURNS),
            column: 0,
            rng: Rng::default(),
            running: false,
            exited: true,
            pending: None,
        }
    }
}

/// ## BASIC machine
///
/// Executes one statement per `step`. A statement is compiled the first
/// time it runs and the code is kept on the statement itself.

pub struct Runtime {
    program: Program,
    dialect: Dialect,
    builtins: Builtins,
    state: State,
    stack: Stack<Val>,
    input: VecDeque<Val>,
    depth: usize,
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime::new()
    }
}

impl Runtime {
    pub fn new() -> Runtime {
        let dialect = Dialect::default();
        let builtins = Builtins::new(&dialect);
        Runtime {
            program: Program::new(),
            dialect,
            builtins,
            state: State::new(),
            stack: Stack::new("EXPRESSION TOO COMPLEX"),
            input: VecDeque::new(),
            depth: 0,
        }
    }

    /// Replace the program. Every statement is compiled up front so
    /// mistakes surface here, located. Variables survive; the program
    /// counter follows its label when the new program still has it.
    pub fn load(&mut self, ast: ast::Program) -> Result<()> {
        let label = self.program.label_at(self.state.pc);
        let program = Program::load(&ast)?;
        let dialect = ast.dialect;
        let builtins = Builtins::new(&dialect);
        for statement in program.statements() {
            statement.cache(|s| compile(&dialect, &builtins, s))?;
        }
        self.program = program;
        self.dialect = dialect;
        self.builtins = builtins;
        self.state.pc = label
            .and_then(|label| self.program.address(&label).ok())
            .unwrap_or(0);
        self.state.data_ptr = self.state.data_ptr.min(self.program.data_len());
        debug!(
            "loaded {} statements, {} data values, dialect {}",
            self.program.len(),
            self.program.data_len(),
            self.dialect.dialect_name
        );
        Ok(())
    }

    /// Start over from the first statement with fresh variables.
    pub fn reset(&mut self) -> Result<()> {
        self.state.pc = 0;
        self.state.data_ptr = 0;
        self.state.returns.clear();
        self.state.column = 0;
        self.state.pending = None;
        self.state.running = false;
        self.state.exited = false;
        self.stack.clear();
        self.input.clear();
        self.depth = 0;
        self.clear_vars()?;
        self.state.running = true;
        debug!("reset");
        Ok(())
    }

    pub fn step(&mut self, host: &mut dyn Host) -> Event {
        if let Some(pending) = &self.state.pending {
            return Event::Input(pending.prompt.clone(), pending.count);
        }
        if !self.state.running {
            return Event::Stopped;
        }
        let pc = self.state.pc;
        let compiled = self.program.statement(pc).map(|statement| {
            trace!("{} {} {}", pc, statement.loc, statement.command.keyword());
            statement
                .cache(|s| compile(&self.dialect, &self.builtins, s))
                .map(|code| (code, statement.loc.clone()))
        });
        let (code, loc) = match compiled {
            None => {
                self.finish();
                return Event::Stopped;
            }
            Some(Err(error)) => return self.halt(pc, error),
            Some(Ok(compiled)) => compiled,
        };
        self.state.pc += 1;
        self.stack.clear();
        self.depth = 0;
        match self.execute(&code, 0, host) {
            Err(error) => self.halt(pc, error.in_location(&loc)),
            Ok(Flow::Suspend) => match &self.state.pending {
                Some(pending) => Event::Input(pending.prompt.clone(), pending.count),
                None => Event::Stopped,
            },
            Ok(Flow::Next) => {
                if self.state.pc >= self.program.len() {
                    self.finish();
                    Event::Stopped
                } else {
                    Event::Running
                }
            }
        }
    }

    /// Answer the pending INPUT or GET. Missing values read as empty
    /// strings. When any value is unusable for its variable nothing is
    /// assigned and the statement asks again on the next step.
    pub fn input(&mut self, values: Vec<String>, host: &mut dyn Host) -> Result<()> {
        let pending = match self.state.pending.take() {
            Some(pending) => pending,
            None => return Err(error!(InternalError; "NOT WAITING FOR INPUT")),
        };
        let pc = self.state.pc;
        let values: Vec<Val> = values.into_iter().map(Val::from).collect();
        let valid = pending.targets.iter().enumerate().all(|(idx, ident)| {
            let value = values.get(idx).cloned().unwrap_or_else(|| Val::from(""));
            Var::is_valid(&Var::convert(ident, value), &self.dialect)
        });
        if !valid {
            debug!("input rejected, asking again");
            self.state.running = true;
            host.resume();
            return Ok(());
        }
        let (code, loc) = match self.program.statement(pc) {
            Some(statement) => (statement.compiled().cloned(), statement.loc.clone()),
            None => (None, SourceLocation::default()),
        };
        let code = code.ok_or_else(|| error!(InternalError; "INPUT STATEMENT NOT COMPILED"))?;
        self.input = values.into();
        self.stack.clear();
        self.depth = 0;
        self.state.pc = pc + 1;
        self.state.running = true;
        if let Err(error) = self.execute(&code, pending.resume, host) {
            let error = error.in_location(&loc);
            self.halt(pc, error.clone());
            return Err(error);
        }
        self.input.clear();
        host.resume();
        Ok(())
    }

    /// Stop at the current statement as if BREAK was pressed.
    pub fn interrupt(&mut self) -> Error {
        self.state.running = false;
        self.state.pending = None;
        let error = match self.current_location() {
            Some(loc) => error!(Break, &loc),
            None => error!(Break),
        };
        debug!("{}", error);
        error
    }

    pub fn save_state(&self) -> Snapshot {
        Snapshot {
            pc: self.state.pc,
            data_ptr: self.state.data_ptr,
            var: self.state.var.clone(),
            for_loops: self.state.for_loops.clone(),
            while_loops: self.state.whiles.to_vec(),
            returns: self.state.returns.to_vec(),
            column: self.state.column,
            rng: self.state.rng.clone(),
            running: self.state.running,
            exited: self.state.exited,
            pending: self.state.pending.clone(),
        }
    }

    pub fn load_state(&mut self, snapshot: Snapshot) -> Result<()> {
        self.state.whiles.replace(snapshot.while_loops)?;
        self.state.returns.replace(snapshot.returns)?;
        self.state.pc = snapshot.pc;
        self.state.data_ptr = snapshot.data_ptr;
        self.state.var = snapshot.var;
        self.state.for_loops = snapshot.for_loops;
        self.state.column = snapshot.column;
        self.state.rng = snapshot.rng;
        self.state.running = snapshot.running;
        self.state.exited = snapshot.exited;
        self.state.pending = snapshot.pending;
        self.stack.clear();
        self.input.clear();
        self.depth = 0;
        debug!("state restored at {}", self.state.pc);
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    pub fn is_exited(&self) -> bool {
        self.state.exited
    }

    pub fn is_waiting(&self) -> bool {
        self.state.pending.is_some()
    }

    pub fn pc(&self) -> Address {
        self.state.pc
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    pub fn return_depth(&self) -> usize {
        self.state.returns.len()
    }

    pub fn column(&self) -> usize {
        self.state.column
    }

    /// Current value of a scalar variable, if it was ever assigned.
    pub fn variable(&self, name: &str) -> Option<Val> {
        self.state.var.get(&Ident::new(name)).cloned()
    }

    pub fn current_location(&self) -> Option<SourceLocation> {
        self.program.statement(self.state.pc).map(|s| s.loc.clone())
    }

    fn halt(&mut self, pc: Address, error: Error) -> Event {
        self.state.pc = pc;
        self.state.running = false;
        self.state.pending = None;
        debug!("halted: {}", error);
        Event::Error(error)
    }

    fn finish(&mut self) {
        self.state.running = false;
        self.state.exited = true;
        debug!("program ended");
    }

    fn clear_vars(&mut self) -> Result<()> {
        self.state.var.clear();
        self.state.for_loops.clear();
        self.state.whiles.clear();
        self.state.rng = Rng::default();
        if !self.dialect.static_arrays {
            return Ok(());
        }
        let mut dims = vec![];
        for statement in self.program.statements() {
            if let ast::Command::Dim { .. } = statement.command {
                for code in compile_dim(&self.dialect, &self.builtins, statement)? {
                    dims.push((code, statement.loc.clone()));
                }
            }
        }
        for (code, loc) in dims {
            self.execute(&code, 0, &mut Quiet)
                .map_err(|e| e.in_location(&loc))?;
        }
        Ok(())
    }

    fn execute(&mut self, code: &[Opcode], start: usize, host: &mut dyn Host) -> Result<Flow> {
        for (idx, op) in code.iter().enumerate().skip(start) {
            if self.expression_op(op, &[])? {
                continue;
            }
            match op {
                Opcode::Pop(ident) => {
                    let value = self.stack.pop()?;
                    let value = Var::assign(ident, value, &self.dialect, false)?;
                    self.state.var.store(ident, value);
                }
                Opcode::PopArr(ident, len) => {
                    let indices = self.pop_numbers(*len)?;
                    let value = self.stack.pop()?;
                    let value = Var::assign(ident, value, &self.dialect, false)?;
                    self.state
                        .var
                        .store_array(ident, &indices, value, &self.dialect)?;
                }
                Opcode::PopSlice(ident, len) => {
                    let positions = self.pop_numbers(*len)?;
                    let value = self.stack.pop()?;
                    self.state
                        .var
                        .store_slice(ident, &positions, value, &self.dialect)?;
                }
                Opcode::DimArr(ident, len) => {
                    let bounds = self.pop_numbers(*len)?;
                    self.state
                        .var
                        .dimension_array(ident, &bounds, &self.dialect)?;
                }
                Opcode::For(ident, has_step) => self.r#for(ident, *has_step)?,
                Opcode::Next(ident) => self.r#next(ident.as_ref())?,
                Opcode::IfNot => {
                    if !self.stack.pop()?.is_truthy() {
                        self.state.pc = flow::skip_to_else(&self.program, self.state.pc);
                    }
                }
                Opcode::Else => self.state.pc = flow::skip_to_eol(&self.program, self.state.pc),
                Opcode::While => {
                    let start = self.state.pc - 1;
                    if self.stack.pop()?.is_truthy() {
                        self.state.whiles.push(start)?;
                    } else {
                        self.state.pc = flow::skip_past_wend(&self.program, start)?;
                    }
                }
                Opcode::Wend => match self.state.whiles.pop() {
                    Ok(start) => self.state.pc = start,
                    Err(_) => return Err(error!(WendWithoutWhile)),
                },
                Opcode::Goto => {
                    let label = self.stack.pop()?.to_label();
                    self.state.pc = self.program.address(&label)?;
                }
                Opcode::Gosub => {
                    let label = self.stack.pop()?.to_label();
                    self.gosub(&label)?;
                }
                Opcode::Return => match self.state.returns.pop() {
                    Ok(pc) => self.state.pc = pc,
                    Err(_) => return Err(error!(ReturnWithoutGosub)),
                },
                Opcode::On(labels, is_gosub) => {
                    let value = self.pop_number()?;
                    let strict = self.dialect.check_on_goto_index;
                    if let Some(idx) = flow::on_index(value, labels.len(), strict)? {
                        if *is_gosub {
                            self.gosub(&labels[idx])?;
                        } else {
                            self.state.pc = self.program.address(&labels[idx])?;
                        }
                    }
                }
                Opcode::PopReturn => {
                    if self.state.returns.pop().is_err() {
                        return Err(error!(ReturnWithoutGosub; "POP WITHOUT GOSUB"));
                    }
                }
                Opcode::End => self.state.pc = self.program.len(),
                Opcode::DefFn(name, function) => self.state.var.define(name, function.clone()),
                Opcode::Print => {
                    let value = self.stack.pop()?;
                    self.print(&value, host);
                }
                Opcode::Input(count) => {
                    let prompt = self.stack.pop()?.to_string();
                    return Ok(self.suspend(prompt, *count, code, idx));
                }
                Opcode::Get => return Ok(self.suspend(String::new(), 1, code, idx)),
                Opcode::InputValue(ident) => {
                    let value = self.input.pop_front().unwrap_or_else(|| Val::from(""));
                    self.stack.push(Var::convert(ident, value))?;
                }
                Opcode::Read(ident) => {
                    let datum = match self.program.datum(self.state.data_ptr) {
                        Some(datum) => datum.clone(),
                        None => return Err(error!(OutOfData)),
                    };
                    self.state.data_ptr += 1;
                    let value = Var::assign(ident, datum, &self.dialect, true)?;
                    self.stack.push(value)?;
                }
                Opcode::Restore(label) => {
                    self.state.data_ptr = match label {
                        Some(label) => self.program.data_offset(label)?,
                        None => 0,
                    }
                }
                Opcode::Clear => self.clear_vars()?,
                Opcode::Randomize => self.state.rng.randomize(),
                _ => return Err(error!(InternalError; format!("UNEXPECTED {}", op))),
            }
        }
        Ok(Flow::Next)
    }

    /// Runs an opcode that only touches the operand stack. False when
    /// `op` is a statement opcode.
    fn expression_op(&mut self, op: &Opcode, locals: &[Val]) -> Result<bool> {
        match op {
            Opcode::Literal(val) => self.stack.push(val.clone())?,
            Opcode::Local(idx) => match locals.get(*idx) {
                Some(val) => self.stack.push(val.clone())?,
                None => return Err(error!(InternalError; "NO SUCH PARAMETER")),
            },
            Opcode::Push(ident) => {
                let val = self.state.var.fetch(ident, &self.dialect)?;
                self.stack.push(val)?;
            }
            Opcode::PushArr(ident, len) => {
                let indices = self.pop_numbers(*len)?;
                let val = self
                    .state
                    .var
                    .fetch_array(ident, &indices, &self.dialect)?;
                self.stack.push(val)?;
            }
            Opcode::PushSlice(ident, len) => {
                let positions = self.pop_numbers(*len)?;
                let val = self
                    .state
                    .var
                    .fetch_slice(ident, &positions, &self.dialect)?;
                self.stack.push(val)?;
            }
            Opcode::Neg => {
                let val = self.stack.pop()?;
                self.stack.push(Operation::negate(val)?)?;
            }
            Opcode::Not => {
                let val = self.stack.pop()?;
                self.stack.push(Operation::not(val, &self.dialect))?;
            }
            Opcode::BitNot => {
                let val = self.stack.pop()?;
                self.stack.push(Operation::bit_not(val)?)?;
            }
            Opcode::Pow => self.binary(Operation::power)?,
            Opcode::Mul => self.binary(Operation::multiply)?,
            Opcode::Div => self.binary(Operation::divide)?,
            Opcode::DivInt => self.binary(Operation::divide_int)?,
            Opcode::Mod => self.binary(Operation::remainder)?,
            Opcode::Add => self.binary_in_dialect(Operation::sum)?,
            Opcode::Sub => self.binary(Operation::subtract)?,
            Opcode::Eq => self.binary_in_dialect(Operation::equal)?,
            Opcode::NotEq => self.binary_in_dialect(Operation::not_equal)?,
            Opcode::Lt => self.binary_in_dialect(Operation::less)?,
            Opcode::LtEq => self.binary_in_dialect(Operation::less_equal)?,
            Opcode::Gt => self.binary_in_dialect(Operation::greater)?,
            Opcode::GtEq => self.binary_in_dialect(Operation::greater_equal)?,
            Opcode::And => {
                let (lhs, rhs) = self.stack.pop_2()?;
                self.stack.push(Operation::and(lhs, rhs, &self.dialect))?;
            }
            Opcode::Or => {
                let (lhs, rhs) = self.stack.pop_2()?;
                self.stack.push(Operation::or(lhs, rhs, &self.dialect))?;
            }
            Opcode::BitAnd => self.binary(Operation::bit_and)?,
            Opcode::BitOr => self.binary(Operation::bit_or)?,
            Opcode::BitXor => self.binary(Operation::bit_xor)?,
            Opcode::Imp => self.binary(Operation::implication)?,
            Opcode::Eqv => self.binary(Operation::equivalence)?,
            Opcode::Min => self.binary(Operation::min)?,
            Opcode::Max => self.binary(Operation::max)?,
            Opcode::Fn(name, len) => {
                let args = self.stack.pop_n(*len)?;
                let val = self.call_fn(name, args)?;
                self.stack.push(val)?;
            }
            Opcode::Builtin(builtin, len) => {
                let args = self.stack.pop_n(*len)?;
                let mut env = Env {
                    dialect: &self.dialect,
                    column: self.state.column,
                    rng: &mut self.state.rng,
                };
                let val = Function::call(*builtin, args, &mut env)?;
                self.stack.push(val)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    fn binary(&mut self, f: fn(Val, Val) -> Result<Val>) -> Result<()> {
        let (lhs, rhs) = self.stack.pop_2()?;
        self.stack.push(f(lhs, rhs)?)
    }

    fn binary_in_dialect(&mut self, f: fn(Val, Val, &Dialect) -> Result<Val>) -> Result<()> {
        let (lhs, rhs) = self.stack.pop_2()?;
        let val = f(lhs, rhs, &self.dialect)?;
        self.stack.push(val)
    }

    fn call_fn(&mut self, name: &str, args: Vec<Val>) -> Result<Val> {
        let function = self.state.var.function(name)?;
        if args.len() != function.params.len() {
            return Err(error!(IllegalFunctionCall;
                format!("{} TAKES {} ARGUMENTS", name, function.params.len())));
        }
        if self.depth >= MAX_CALL_DEPTH {
            return Err(error!(OutOfMemory; "FUNCTIONS NESTED TOO DEEPLY"));
        }
        self.depth += 1;
        let result = self.evaluate(&function.code, &args);
        self.depth -= 1;
        result
    }

    fn evaluate(&mut self, code: &Code, locals: &[Val]) -> Result<Val> {
        for op in code.iter() {
            if !self.expression_op(op, locals)? {
                return Err(error!(InternalError; format!("UNEXPECTED {} IN FUNCTION", op)));
            }
        }
        self.stack.pop()
    }

    fn pop_number(&mut self) -> Result<f64> {
        match self.stack.pop()? {
            Val::Number(n) => Ok(n),
            Val::String(_) => Err(error!(TypeMismatch)),
        }
    }

    fn pop_numbers(&mut self, len: usize) -> Result<Vec<f64>> {
        self.stack
            .pop_n(len)?
            .into_iter()
            .map(Operation::index)
            .collect()
    }

    fn gosub(&mut self, label: &str) -> Result<()> {
        let target = self.program.address(label)?;
        self.state.returns.push(self.state.pc)?;
        self.state.pc = target;
        Ok(())
    }

    fn r#for(&mut self, ident: &Ident, has_step: bool) -> Result<()> {
        let step = if has_step { self.pop_number()? } else { 1.0 };
        let target = self.pop_number()?;
        let initial = self.pop_number()?;
        let value = Var::assign(ident, Val::Number(initial), &self.dialect, false)?;
        self.state.var.store(ident, value);
        let record = ForLoop {
            var: ident.clone(),
            target,
            step,
            body: self.state.pc,
        };
        if self.dialect.test_initial_for && record.is_done(initial) {
            self.state.pc = flow::skip_past_next(&self.program, self.state.pc, ident)?;
            return Ok(());
        }
        self.state.for_loops.retain(|f| f.var != *ident);
        self.state.for_loops.push(record);
        Ok(())
    }

    fn r#next(&mut self, ident: Option<&Ident>) -> Result<()> {
        let pos = match ident {
            Some(ident) => self.state.for_loops.iter().rposition(|f| f.var == *ident),
            None if self.dialect.optional_next_var => self.state.for_loops.len().checked_sub(1),
            None => return Err(error!(Dialect; "NEXT NEEDS A VARIABLE")),
        };
        let pos = match (pos, ident) {
            (Some(pos), _) => pos,
            (None, Some(ident)) => return Err(error!(NextWithoutFor; ident.to_string())),
            (None, None) => return Err(error!(NextWithoutFor)),
        };
        self.state.for_loops.truncate(pos + 1);
        let record = match self.state.for_loops.last() {
            Some(record) => record.clone(),
            None => return Err(error!(NextWithoutFor)),
        };
        let value = match self.state.var.fetch(&record.var, &self.dialect)? {
            Val::Number(n) => n + record.step,
            Val::String(_) => return Err(error!(TypeMismatch)),
        };
        self.state.var.store(&record.var, Val::Number(value));
        if record.is_done(value) {
            self.state.for_loops.pop();
        } else {
            self.state.pc = record.body;
        }
        Ok(())
    }

    fn print(&mut self, value: &Val, host: &mut dyn Host) {
        let text = match value {
            Val::Number(n) => format_number(
                *n,
                self.dialect.print_zone_length,
                self.dialect.numeric_padding,
            ),
            Val::String(s) if s.as_ref() == "\t" => {
                let zone = self.dialect.print_zone_length.max(1);
                let next = (self.state.column / zone + 1) * zone;
                " ".repeat(next - self.state.column)
            }
            Val::String(s) => s.to_string(),
        };
        match text.rfind('\n') {
            Some(idx) => self.state.column = text[idx + 1..].chars().count(),
            None => self.state.column += text.chars().count(),
        }
        host.print(&text);
    }

    fn suspend(&mut self, prompt: String, count: usize, code: &[Opcode], idx: usize) -> Flow {
        let targets = code[idx + 1..]
            .iter()
            .filter_map(|op| match op {
                Opcode::InputValue(ident) => Some(ident.clone()),
                _ => None,
            })
            .collect();
        self.state.pc -= 1;
        self.state.running = false;
        self.state.pending = Some(Pending {
            prompt,
            count,
            resume: idx + 1,
            targets,
        });
        Flow::Suspend
    }
}
