//! Native binding registration builders.
//!
//! # Responsibility
//! - Install native globals, constructors and prototype methods with the
//!   attribute semantics the shell guarantees to scripts.
//!
//! # Invariants
//! - Prototype methods are read-only, non-enumerable, non-configurable.
//! - Constructors are installed as non-enumerable globals.
//! - Primitive globals use plain assignment semantics (all attributes set).

use boa_engine::object::{FunctionObjectBuilder, JsObject, NativeObject, ObjectInitializer};
use boa_engine::property::{Attribute, PropertyDescriptor};
use boa_engine::{Context, JsResult, JsString, JsValue, NativeFunction};
use boa_gc::{custom_trace, Finalize, Trace};

/// Installs a native global function under `name` with the declared arity.
pub fn register_global_function(
    context: &mut Context,
    name: &str,
    arity: usize,
    body: NativeFunction,
) -> JsResult<()> {
    context.register_global_builtin_callable(JsString::from(name), arity, body)
}

/// Installs a numeric global property.
pub fn register_global_number(context: &mut Context, name: &str, value: f64) -> JsResult<()> {
    context.register_global_property(JsString::from(name), value, Attribute::all())
}

/// Installs a boolean global property.
pub fn register_global_bool(context: &mut Context, name: &str, value: bool) -> JsResult<()> {
    context.register_global_property(JsString::from(name), value, Attribute::all())
}

/// Installs a string global property.
pub fn register_global_string(context: &mut Context, name: &str, value: &str) -> JsResult<()> {
    context.register_global_property(JsString::from(name), JsString::from(value), Attribute::all())
}

/// Defines one locked method on `target`.
///
/// Locked means read-only, non-enumerable, non-configurable: scripts can
/// call the method but cannot shadow, enumerate or delete it.
pub fn define_method(
    context: &mut Context,
    target: &JsObject,
    name: &str,
    arity: usize,
    body: NativeFunction,
) -> JsResult<()> {
    let function = FunctionObjectBuilder::new(context.realm(), body)
        .name(JsString::from(name))
        .length(arity)
        .constructor(false)
        .build();
    target.define_property_or_throw(
        JsString::from(name),
        PropertyDescriptor::builder()
            .value(function)
            .writable(false)
            .enumerable(false)
            .configurable(false)
            .build(),
        context,
    )?;
    Ok(())
}

#[derive(Finalize)]
struct PrototypeCapture {
    prototype: JsObject,
}

unsafe impl Trace for PrototypeCapture {
    custom_trace!(this, mark, {
        mark(&this.prototype);
    });
}

/// Declarative native class: a global constructor plus locked prototype
/// methods around one host-native data type.
pub struct NativeClassSpec {
    name: &'static str,
    arity: usize,
    methods: Vec<(&'static str, usize, NativeFunction)>,
}

impl NativeClassSpec {
    pub fn new(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            arity,
            methods: Vec::new(),
        }
    }

    /// Adds one prototype method.
    pub fn method(mut self, name: &'static str, arity: usize, body: NativeFunction) -> Self {
        self.methods.push((name, arity, body));
        self
    }

    /// Installs the class and returns its prototype object.
    ///
    /// `construct` produces the host-native data for one new instance; the
    /// instance object is created on the class prototype so receiver checks
    /// can verify the type tag.
    pub fn register<T, F>(self, context: &mut Context, construct: F) -> JsResult<JsObject>
    where
        T: NativeObject,
        F: Fn(&JsValue, &[JsValue], &mut Context) -> JsResult<T> + 'static,
    {
        let prototype = ObjectInitializer::new(context).build();
        for (name, arity, body) in self.methods {
            define_method(context, &prototype, name, arity, body)?;
        }

        let constructor_fn = unsafe {
            NativeFunction::from_closure_with_captures(
                move |this, args, captures, ctx| {
                    let data = construct(this, args, ctx)?;
                    let instance = JsObject::from_proto_and_data(captures.prototype.clone(), data);
                    Ok(JsValue::from(instance))
                },
                PrototypeCapture {
                    prototype: prototype.clone(),
                },
            )
        };
        let constructor: JsObject = FunctionObjectBuilder::new(context.realm(), constructor_fn)
            .name(JsString::from(self.name))
            .length(self.arity)
            .constructor(true)
            .build()
            .into();

        constructor.define_property_or_throw(
            JsString::from("prototype"),
            PropertyDescriptor::builder()
                .value(prototype.clone())
                .writable(false)
                .enumerable(false)
                .configurable(false)
                .build(),
            context,
        )?;
        prototype.define_property_or_throw(
            JsString::from("constructor"),
            PropertyDescriptor::builder()
                .value(constructor.clone())
                .writable(true)
                .enumerable(false)
                .configurable(true)
                .build(),
            context,
        )?;

        context.register_global_property(
            JsString::from(self.name),
            constructor,
            Attribute::WRITABLE | Attribute::CONFIGURABLE,
        )?;
        Ok(prototype)
    }
}
