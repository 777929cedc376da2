// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tree-walking interpreter.

use crate::ast::*;
use crate::builtins;
use crate::error::{Result, ScriptError};
use crate::parser::parse;
use crate::runtime::{
    Function, FunctionKind, Scope, Value, binary_operation, number_to_string, string_argument,
};
use crate::stack::ensure_sufficient_stack;
use shimjs_loader::{Evaluator, ModuleScope};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Default bound on nested script calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// How a statement finished.
enum Completion {
    /// Ran to the end; carries the value of an expression statement
    Normal(Option<Value>),
    /// Hit a return statement
    Return(Value),
}

/// The script interpreter.
///
/// Owns the global environment. As an [`Evaluator`] it runs module bodies
/// for a [`ModuleLoader`](shimjs_loader::ModuleLoader), each in its own
/// function-like scope over the globals.
pub struct Interpreter {
    globals: Scope,
    depth: usize,
    max_call_depth: usize,
    printer: Box<dyn FnMut(&str)>,
}

impl Interpreter {
    /// Creates an interpreter with the builtin globals.
    pub fn new() -> Self {
        let globals = Scope::global();
        builtins::install(&globals);
        Self {
            globals,
            depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            printer: Box::new(|line| println!("{}", line)),
        }
    }

    /// Sets the bound on nested calls.
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    /// Redirects `print` output.
    pub fn set_printer(&mut self, printer: impl FnMut(&str) + 'static) {
        self.printer = Box::new(printer);
    }

    pub(crate) fn print(&mut self, line: &str) {
        (self.printer)(line);
    }

    /// The global environment.
    pub fn globals(&self) -> &Scope {
        &self.globals
    }

    /// Evaluates code in a throw-away scope over the globals.
    ///
    /// Declarations and new globals the code creates are dropped afterwards;
    /// changes to existing objects are not. Returns the value of the last
    /// expression statement.
    pub fn eval(&mut self, source: &str) -> Result<Value> {
        trace!(bytes = source.len(), "eval");
        let program = parse(source)?;
        let shield = Scope::shield(&self.globals);
        self.run_program(&program.body, &shield)
    }

    /// Evaluates code directly in the global scope, keeping its definitions.
    pub fn eval_into_engine(&mut self, source: &str) -> Result<Value> {
        trace!(bytes = source.len(), "eval into engine");
        let program = parse(source)?;
        let globals = self.globals.clone();
        self.run_program(&program.body, &globals)
    }

    /// Calls the global function `name`.
    pub fn invoke_function(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self
            .globals
            .lookup(name)
            .ok_or_else(|| ScriptError::not_defined(name))?;
        if !function.is_function() {
            return Err(ScriptError::type_error(format!("{} is not a function", name)));
        }
        self.call_function(&function, Value::Undefined, args)
    }

    /// Calls `target[name]` with `target` as `this`.
    pub fn invoke_method(&mut self, target: &Value, name: &str, args: &[Value]) -> Result<Value> {
        let method = target.get_property(name)?;
        if !method.is_function() {
            return Err(ScriptError::type_error(format!("{} is not a function", name)));
        }
        self.call_function(&method, target.clone(), args)
    }

    /// Resolves a dotted path such as `config.server.port` from the globals.
    pub fn get_script_object(&self, path: &str) -> Result<Value> {
        let mut segments = path.split('.').map(str::trim);
        let root = segments.next().unwrap_or_default();
        let mut value = self
            .globals
            .lookup(root)
            .ok_or_else(|| ScriptError::not_defined(root))?;
        for segment in segments {
            value = value.get_property(segment)?;
        }
        Ok(value)
    }

    /// Defines or overwrites a global binding.
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.declare(name, value, true);
    }

    /// Reads a global binding.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.lookup(name)
    }

    /// Calls a function value.
    pub fn call_function(&mut self, callee: &Value, this: Value, args: &[Value]) -> Result<Value> {
        let Value::Function(function) = callee else {
            return Err(ScriptError::type_error(format!(
                "{} is not a function",
                callee.inspect()
            )));
        };

        if self.depth >= self.max_call_depth {
            return Err(ScriptError::Range("Maximum call stack size exceeded".to_string()));
        }

        self.depth += 1;
        let result = ensure_sufficient_stack(|| self.call_inner(function, this, args));
        self.depth -= 1;
        result
    }

    fn call_inner(&mut self, function: &Rc<Function>, this: Value, args: &[Value]) -> Result<Value> {
        match function.kind() {
            FunctionKind::Script { node, scope } => {
                let local = Scope::function(scope, this);
                if let Some(name) = &node.name {
                    local.declare(name.clone(), Value::Function(Rc::clone(function)), true);
                }
                for (i, param) in node.params.iter().enumerate() {
                    let arg = args.get(i).cloned().unwrap_or(Value::Undefined);
                    local.declare(param.clone(), arg, true);
                }

                self.hoist_declarations(&node.body, &local);
                match self.execute_block(&node.body, &local)? {
                    Completion::Return(value) => Ok(value),
                    Completion::Normal(_) => Ok(Value::Undefined),
                }
            }
            FunctionKind::Native(native) => (**native)(self, &this, args),
            FunctionKind::Require(require) => {
                let specifier = string_argument(args, "id")?;
                require.call(self, &specifier).map_err(ScriptError::from)
            }
        }
    }

    /// Runs a module body with its CommonJS bindings.
    fn run_module(&mut self, source: &str, bindings: &mut ModuleScope<Value>) -> Result<()> {
        trace!(module = %bindings.module.id, "running module body");
        let program = parse(source)?;

        let module = Value::object_from([
            ("id".to_string(), Value::from(bindings.module.id.as_str())),
            ("filename".to_string(), Value::from(bindings.module.filename.as_str())),
            ("exports".to_string(), bindings.module.exports.clone()),
            ("loaded".to_string(), Value::Boolean(false)),
        ]);
        let exports = bindings.exports.clone();

        let scope = Scope::function(&self.globals, exports.clone());
        let require = Function::require(bindings.require.clone());
        scope.declare("require", Value::Function(Rc::new(require)), true);
        scope.declare("module", module.clone(), true);
        scope.declare("exports", exports, true);
        scope.declare("__filename", Value::from(bindings.module.filename.as_str()), true);
        scope.declare("__dirname", Value::from(bindings.dirname()), true);

        self.run_program(&program.body, &scope)?;

        bindings.module.exports = module.get_property("exports")?;
        module.set_property("loaded", Value::Boolean(true))?;
        Ok(())
    }

    fn run_program(&mut self, body: &[Statement], scope: &Scope) -> Result<Value> {
        self.hoist_declarations(body, scope);
        match self.execute_block(body, scope)? {
            Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
            Completion::Return(value) => Ok(value),
        }
    }

    /// Declares `var` names and function declarations ahead of execution
    fn hoist_declarations(&mut self, body: &[Statement], scope: &Scope) {
        let var_scope = scope.var_scope();
        let mut names = Vec::new();
        collect_var_names(body, &mut names);
        for name in names {
            if !var_scope.has_own(&name) {
                var_scope.declare(name, Value::Undefined, true);
            }
        }
        self.hoist_functions(body, scope);
    }

    fn hoist_functions(&mut self, body: &[Statement], scope: &Scope) {
        for statement in body {
            if let Statement::FunctionDeclaration(node) = statement {
                if let Some(name) = &node.name {
                    let function = Function::script(Rc::clone(node), scope.clone());
                    scope.declare(name.clone(), Value::Function(Rc::new(function)), true);
                }
            }
        }
    }

    fn execute_block(&mut self, body: &[Statement], scope: &Scope) -> Result<Completion> {
        let mut last = None;
        for statement in body {
            match self.execute(statement, scope)? {
                Completion::Normal(Some(value)) => last = Some(value),
                Completion::Normal(None) => {}
                Completion::Return(value) => return Ok(Completion::Return(value)),
            }
        }
        Ok(Completion::Normal(last))
    }

    fn execute(&mut self, statement: &Statement, scope: &Scope) -> Result<Completion> {
        ensure_sufficient_stack(|| self.execute_inner(statement, scope))
    }

    fn execute_inner(&mut self, statement: &Statement, scope: &Scope) -> Result<Completion> {
        match statement {
            Statement::VariableDeclaration(declaration) => {
                self.declare_variables(declaration, scope)?;
                Ok(Completion::Normal(None))
            }
            // Hoisted
            Statement::FunctionDeclaration(_) | Statement::Empty => Ok(Completion::Normal(None)),
            Statement::Expression(expression) => {
                let value = self.eval_expression(expression, scope)?;
                Ok(Completion::Normal(Some(value)))
            }
            Statement::Block(body) => {
                let block = Scope::block(scope);
                self.hoist_functions(body, &block);
                self.execute_block(body, &block)
            }
            Statement::If(stmt) => {
                if self.eval_expression(&stmt.test, scope)?.to_boolean() {
                    self.execute(&stmt.consequent, scope)
                } else if let Some(alternate) = &stmt.alternate {
                    self.execute(alternate, scope)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            Statement::Return(argument) => {
                let value = match argument {
                    Some(expression) => self.eval_expression(expression, scope)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(value))
            }
            Statement::Throw(expression) => {
                let value = self.eval_expression(expression, scope)?;
                Err(ScriptError::Thrown(describe_thrown(&value)))
            }
        }
    }

    fn declare_variables(&mut self, declaration: &VariableDeclaration, scope: &Scope) -> Result<()> {
        for declarator in &declaration.declarations {
            match declaration.kind {
                VariableKind::Var => {
                    // Already hoisted; only an initializer changes anything
                    if let Some(init) = &declarator.init {
                        let value = self.eval_expression(init, scope)?;
                        scope.var_scope().declare(declarator.name.clone(), value, true);
                    }
                }
                VariableKind::Let | VariableKind::Const => {
                    let value = match &declarator.init {
                        Some(init) => self.eval_expression(init, scope)?,
                        None => Value::Undefined,
                    };
                    let mutable = declaration.kind == VariableKind::Let;
                    scope.declare(declarator.name.clone(), value, mutable);
                }
            }
        }
        Ok(())
    }

    fn eval_expression(&mut self, expression: &Expression, scope: &Scope) -> Result<Value> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expression, scope))
    }

    fn eval_expression_inner(&mut self, expression: &Expression, scope: &Scope) -> Result<Value> {
        match expression {
            Expression::Number(n) => Ok(Value::Number(*n)),
            Expression::String(s) => Ok(Value::from(s.as_str())),
            Expression::Boolean(b) => Ok(Value::Boolean(*b)),
            Expression::Null => Ok(Value::Null),
            Expression::Identifier(name) => {
                scope.lookup(name).ok_or_else(|| ScriptError::not_defined(name))
            }
            Expression::This => Ok(scope.this_value()),
            Expression::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expression(element, scope)?);
                }
                Ok(Value::array(values))
            }
            Expression::Object(properties) => {
                let mut entries = Vec::with_capacity(properties.len());
                for (key, value) in properties {
                    entries.push((key.clone(), self.eval_expression(value, scope)?));
                }
                Ok(Value::object_from(entries))
            }
            Expression::Function(node) => {
                let function = Function::script(Rc::clone(node), scope.clone());
                Ok(Value::Function(Rc::new(function)))
            }
            Expression::Member(member) => {
                let object = self.eval_expression(&member.object, scope)?;
                let key = self.property_key(&member.property, scope)?;
                object.get_property(&key)
            }
            Expression::Call(call) => self.eval_call(call, scope),
            Expression::Assign(assign) => self.eval_assign(assign, scope),
            Expression::Binary(binary) => {
                let left = self.eval_expression(&binary.left, scope)?;
                let right = self.eval_expression(&binary.right, scope)?;
                Ok(binary_operation(binary.operator, &left, &right))
            }
            Expression::Logical(logical) => {
                let left = self.eval_expression(&logical.left, scope)?;
                let short_circuit = match logical.operator {
                    LogicalOperator::And => !left.to_boolean(),
                    LogicalOperator::Or => left.to_boolean(),
                };
                if short_circuit {
                    Ok(left)
                } else {
                    self.eval_expression(&logical.right, scope)
                }
            }
            Expression::Unary(unary) => self.eval_unary(unary, scope),
            Expression::Conditional(conditional) => {
                if self.eval_expression(&conditional.test, scope)?.to_boolean() {
                    self.eval_expression(&conditional.consequent, scope)
                } else {
                    self.eval_expression(&conditional.alternate, scope)
                }
            }
        }
    }

    fn property_key(&mut self, property: &MemberProperty, scope: &Scope) -> Result<String> {
        match property {
            MemberProperty::Named(name) => Ok(name.clone()),
            MemberProperty::Computed(expression) => {
                let key = self.eval_expression(expression, scope)?;
                Ok(match key {
                    Value::Number(n) => number_to_string(n),
                    other => other.to_display_string(),
                })
            }
        }
    }

    fn eval_call(&mut self, call: &CallExpression, scope: &Scope) -> Result<Value> {
        let (callee, this) = match call.callee.as_ref() {
            Expression::Member(member) => {
                let object = self.eval_expression(&member.object, scope)?;
                let key = self.property_key(&member.property, scope)?;
                (object.get_property(&key)?, object)
            }
            other => (self.eval_expression(other, scope)?, Value::Undefined),
        };

        let mut args = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            args.push(self.eval_expression(argument, scope)?);
        }

        if !callee.is_function() {
            return Err(ScriptError::type_error(format!(
                "{} is not a function",
                describe_callee(&call.callee)
            )));
        }
        self.call_function(&callee, this, &args)
    }

    fn eval_assign(&mut self, assign: &AssignExpression, scope: &Scope) -> Result<Value> {
        match assign.target.as_ref() {
            Expression::Identifier(name) => {
                let value = match assign.operator.binary() {
                    None => self.eval_expression(&assign.value, scope)?,
                    Some(operator) => {
                        let current = scope
                            .lookup(name)
                            .ok_or_else(|| ScriptError::not_defined(name))?;
                        let right = self.eval_expression(&assign.value, scope)?;
                        binary_operation(operator, &current, &right)
                    }
                };
                scope.assign(name, value.clone())?;
                Ok(value)
            }
            Expression::Member(member) => {
                let object = self.eval_expression(&member.object, scope)?;
                let key = self.property_key(&member.property, scope)?;
                let value = match assign.operator.binary() {
                    None => self.eval_expression(&assign.value, scope)?,
                    Some(operator) => {
                        let current = object.get_property(&key)?;
                        let right = self.eval_expression(&assign.value, scope)?;
                        binary_operation(operator, &current, &right)
                    }
                };
                object.set_property(&key, value.clone())?;
                Ok(value)
            }
            _ => Err(ScriptError::Reference(
                "Invalid left-hand side in assignment".to_string(),
            )),
        }
    }

    fn eval_unary(&mut self, unary: &UnaryExpression, scope: &Scope) -> Result<Value> {
        // typeof tolerates undeclared names
        if unary.operator == UnaryOperator::Typeof {
            if let Expression::Identifier(name) = unary.argument.as_ref() {
                if scope.lookup(name).is_none() {
                    return Ok(Value::from("undefined"));
                }
            }
        }

        let argument = self.eval_expression(&unary.argument, scope)?;
        Ok(match unary.operator {
            UnaryOperator::Typeof => Value::from(argument.type_of()),
            UnaryOperator::Not => Value::Boolean(!argument.to_boolean()),
            UnaryOperator::Minus => Value::Number(-argument.to_number()),
            UnaryOperator::Plus => Value::Number(argument.to_number()),
        })
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("globals", &self.globals.names())
            .field("depth", &self.depth)
            .field("max_call_depth", &self.max_call_depth)
            .finish_non_exhaustive()
    }
}

impl Evaluator<Value> for Interpreter {
    fn new_exports(&mut self) -> Value {
        Value::new_object()
    }

    fn same_exports(&self, a: &Value, b: &Value) -> bool {
        a.same_value(b)
    }

    fn evaluate(&mut self, source: &str, scope: &mut ModuleScope<Value>) -> shimjs_loader::Result<()> {
        self.run_module(source, scope)
            .map_err(ScriptError::into_loader_error)
    }
}

/// `var` names declared anywhere in `body` outside nested functions
fn collect_var_names(body: &[Statement], names: &mut Vec<String>) {
    for statement in body {
        match statement {
            Statement::VariableDeclaration(declaration) if declaration.kind == VariableKind::Var => {
                names.extend(declaration.declarations.iter().map(|d| d.name.clone()));
            }
            Statement::Block(inner) => collect_var_names(inner, names),
            Statement::If(stmt) => {
                collect_var_names(std::slice::from_ref(stmt.consequent.as_ref()), names);
                if let Some(alternate) = &stmt.alternate {
                    collect_var_names(std::slice::from_ref(alternate.as_ref()), names);
                }
            }
            _ => {}
        }
    }
}

fn describe_callee(expression: &Expression) -> String {
    match expression {
        Expression::Identifier(name) => name.clone(),
        Expression::This => "this".to_string(),
        Expression::Member(member) => match &member.property {
            MemberProperty::Named(name) => format!("{}.{}", describe_callee(&member.object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe_callee(&member.object)),
        },
        _ => "expression".to_string(),
    }
}

fn describe_thrown(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        Value::Object(object) => {
            let object = object.borrow();
            match (object.get("name"), object.get("message")) {
                (Some(name), Some(message)) => format!("{}: {}", name, message),
                (None, Some(message)) => format!("Error: {}", message),
                _ => value.inspect(),
            }
        }
        other => other.inspect(),
    }
}
