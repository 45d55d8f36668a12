//! Object-safe wrapper for registered types
//!
//! Any Rust type the client under test exposes can travel through the
//! harness as a [`Value::Object`](crate::Value::Object) once it implements
//! [`CimType`]. Equality and cloning go through the trait object so the
//! harness never needs to know the concrete type.

use crate::arguments::Arguments;
use crate::error::ArgumentError;
use std::any::Any;
use std::fmt;

/// A concrete type that can be carried inside a [`Value`](crate::Value)
pub trait CimType: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    /// Name used in test cases and in the type registry (e.g. `CIMInstance`)
    const TYPE_NAME: &'static str;
}

/// A [`CimType`] that can be built from named arguments
///
/// Implementations take what they need from `args`; anything left over is
/// rejected by the registry as an unexpected argument.
pub trait Constructible: CimType {
    fn construct(args: &mut Arguments) -> Result<Self, ArgumentError>;
}

/// Type-erased object produced by a registry factory
pub trait CimObject: fmt::Debug + Send + Sync + 'static {
    /// Registered name of the concrete type
    fn type_name(&self) -> &'static str;

    /// Access the concrete value for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another object of any type
    fn eq_object(&self, other: &dyn CimObject) -> bool;

    /// Clone into a new box
    fn clone_object(&self) -> Box<dyn CimObject>;
}

impl<T: CimType> CimObject for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_object(&self, other: &dyn CimObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn clone_object(&self) -> Box<dyn CimObject> {
        Box::new(self.clone())
    }
}

impl dyn CimObject {
    /// Downcast to a concrete registered type
    pub fn downcast_ref<T: CimType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Check whether this object holds a `T`
    pub fn is<T: CimType>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

impl Clone for Box<dyn CimObject> {
    fn clone(&self) -> Self {
        self.clone_object()
    }
}

impl PartialEq for dyn CimObject {
    fn eq(&self, other: &Self) -> bool {
        self.eq_object(other)
    }
}

// Lets `Box<dyn CimObject> == Box<dyn CimObject>` type-check without the
// operator trying to unsize-coerce (and move) the right operand.
impl PartialEq<&Self> for Box<dyn CimObject> {
    fn eq(&self, other: &&Self) -> bool {
        self.eq_object(&***other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl CimType for Point {
        const TYPE_NAME: &'static str = "Point";
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    impl CimType for Label {
        const TYPE_NAME: &'static str = "Label";
    }

    #[test]
    fn test_equal_objects_of_same_type() {
        let a: Box<dyn CimObject> = Box::new(Point { x: 1, y: 2 });
        let b: Box<dyn CimObject> = Box::new(Point { x: 1, y: 2 });
        let c: Box<dyn CimObject> = Box::new(Point { x: 2, y: 1 });

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_objects_of_different_types_never_equal() {
        let a: Box<dyn CimObject> = Box::new(Label("1".into()));
        let b: Box<dyn CimObject> = Box::new(Point { x: 1, y: 1 });

        assert_ne!(a, b);
        assert_eq!(a.type_name(), "Label");
        assert_eq!(b.type_name(), "Point");
    }

    #[test]
    fn test_trait_objects_compare_by_reference() {
        let (a, b, c) = (Point { x: 5, y: 6 }, Point { x: 5, y: 6 }, Label("5".into()));
        let a: &dyn CimObject = &a;
        let b: &dyn CimObject = &b;
        let c: &dyn CimObject = &c;

        assert!(a == b);
        assert!(a != c);
    }

    #[test]
    fn test_downcast_and_clone() {
        let a: Box<dyn CimObject> = Box::new(Point { x: 3, y: 4 });
        let cloned = a.clone();

        assert!(cloned.is::<Point>());
        assert!(!cloned.is::<Label>());
        assert_eq!(cloned.downcast_ref::<Point>(), Some(&Point { x: 3, y: 4 }));
    }
}
