use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::registry::entry::{Home, TestEntryInfo};

/// A live test-class instance shared by the methods of one class.
pub type Instance = Box<dyn Any + Send>;

/// Creates a fresh [`Instance`] the first time a class's method runs.
#[derive(Clone)]
pub struct Constructor(Arc<dyn Fn() -> Instance + Send + Sync>);

impl Constructor {
    pub fn new<F>(make: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        Self(Arc::new(make))
    }

    pub fn build(&self) -> Instance {
        (self.0)()
    }
}

impl Default for Constructor {
    /// Classes without state get a unit instance.
    fn default() -> Self {
        Self::new(|| Box::new(()))
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Constructor(..)")
    }
}

/// A method declared on a [`TestClass`].
#[derive(Debug, Clone)]
pub struct TestMethod {
    pub name: String,
    pub info: TestEntryInfo,
}

impl TestMethod {
    pub fn new(name: impl Into<String>, info: TestEntryInfo) -> Self {
        Self {
            name: name.into(),
            info,
        }
    }
}

/// A class of test methods sharing one lazily-created instance.
#[derive(Debug, Clone)]
pub struct TestClass {
    pub home: Home,
    pub methods: Vec<TestMethod>,
    pub constructor: Constructor,
}

impl TestClass {
    pub fn new(home: impl Into<Home>) -> Self {
        Self {
            home: home.into(),
            methods: Vec::new(),
            constructor: Constructor::default(),
        }
    }

    pub fn method(mut self, name: impl Into<String>, info: TestEntryInfo) -> Self {
        self.methods.push(TestMethod::new(name, info));
        self
    }

    pub fn constructor<F>(mut self, make: F) -> Self
    where
        F: Fn() -> Instance + Send + Sync + 'static,
    {
        self.constructor = Constructor::new(make);
        self
    }
}

/// What a `register` call attaches metadata to.
#[derive(Debug, Clone)]
pub enum Target {
    /// Nothing: composes groups of groups.
    Empty,
    Function(Home),
    Class(TestClass),
}

/// One class instance produced by a factory at plan-build time.
pub struct FactoryInstance {
    pub home: Home,
    pub instance: Instance,
}

impl FactoryInstance {
    pub fn new(home: impl Into<Home>, instance: Instance) -> Self {
        Self {
            home: home.into(),
            instance,
        }
    }
}

impl fmt::Debug for FactoryInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryInstance")
            .field("home", &self.home)
            .finish_non_exhaustive()
    }
}

/// A zero-argument callable producing class instances when a plan is built.
pub type Factory = Box<dyn Fn() -> Vec<FactoryInstance> + Send + Sync>;
