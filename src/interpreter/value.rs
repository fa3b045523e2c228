//! The abstract value model.
//!
//! Every quantity the interpreter tracks — stack slots, name bindings,
//! branch conditions, captured calls — is an [`AbstractValue`] stored in a
//! [`ValueArena`] and addressed by a copyable [`ObjectId`]. Composite
//! variants reference their children by id rather than owning them, so the
//! value graph may contain cycles (an object's attribute overlay can reach
//! the object itself) without making traversal unbounded.
//!
//! # Attribute Overlay
//!
//! Each arena object carries an *attribute overlay*: a map from attribute
//! name to the object explicitly observed or assigned for that attribute
//! during analysis. Reading an attribute absent from the overlay yields a
//! fresh [`AbstractValue::Unknown`] rather than an error; the model never
//! guesses what an unobserved attribute holds.
//!
//! # Variants
//!
//! The variant set is closed and matched exhaustively by the dispatcher and
//! the solver routing, so extending the model forces every dispatch site to
//! be revisited.

use std::collections::BTreeMap;
use std::fmt;

use crate::{bytecode::Literal, Error, Result};

/// Unique identifier of one object in a [`ValueArena`].
///
/// A lightweight index handle, unique within the arena that issued it but
/// not across arenas. Snapshot copies of an
/// [`ExecutionState`](crate::interpreter::ExecutionState) preserve ids, so
/// an id taken before a snapshot resolves to the equal object afterwards.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Creates an identifier from a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the underlying arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "o{}", self.0)
    }
}

/// One branch result inside a [`AbstractValue::PossibleOutcomes`] merge node.
///
/// `conditions` is an ordered conjunction: the outcome applies only when
/// every listed condition holds. The order is the order the conditions were
/// encountered on the path and is never re-ordered once recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The conjunction of conditions under which this outcome applies.
    pub conditions: Vec<ObjectId>,

    /// The value produced on this path.
    pub outcome: ObjectId,
}

impl Outcome {
    /// Creates an outcome guarded by the given condition conjunction.
    #[must_use]
    pub const fn new(conditions: Vec<ObjectId>, outcome: ObjectId) -> Self {
        Self {
            conditions,
            outcome,
        }
    }
}

/// What a loop-carried modification did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopModificationKind {
    /// A value was updated inside the loop body.
    Value,

    /// The loop was exited early.
    Break,

    /// The iteration was cut short.
    Continue,
}

/// The subject of a loop-carried modification: either a produced value or
/// the source-level name that was touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopSubject {
    /// A value in the arena.
    Object(ObjectId),

    /// A source-level name.
    Name(String),
}

/// One modification recorded against a loop body.
///
/// Part of the structural [`AbstractValue::WhileLoop`] summary; the
/// dispatcher does not yet produce these (see the module notes on the loop
/// extension seam).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopModification {
    /// What kind of modification occurred.
    pub kind: LoopModificationKind,

    /// The produced value or the source name that was modified.
    pub subject: LoopSubject,

    /// The resulting abstract object, when one exists.
    pub result: Option<ObjectId>,
}

/// The closed set of abstract value variants.
///
/// Construction is total: no variant construction can fail. Variants carry
/// no behavior beyond the per-object attribute overlay; all semantic
/// interpretation lives in the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractValue {
    /// No information.
    Unknown,

    /// A global-like name with no known binding.
    UnknownName {
        /// The unresolved name.
        name: String,
    },

    /// A local-like name with no known binding.
    ///
    /// Distinct from [`AbstractValue::UnknownName`] because the two
    /// environments are separate namespaces.
    UnknownFastName {
        /// The unresolved name.
        name: String,
    },

    /// A known constant from the function's constant pool.
    Value {
        /// The literal, carried unevaluated.
        value: Literal,
    },

    /// The result of reading an attribute off a base object.
    Attribute {
        /// The object the attribute was read from.
        base: ObjectId,
        /// The attribute name.
        name: String,
        /// The resolved value: the overlay entry if one was recorded,
        /// otherwise a fresh unknown.
        value: ObjectId,
    },

    /// A named external module, resolved by identifier only.
    Module {
        /// The module name.
        name: String,
    },

    /// A recognized global built-in, resolved by identifier only.
    BuiltIn {
        /// The built-in's name.
        name: String,
    },

    /// A captured call site.
    Call {
        /// The callee.
        callee: ObjectId,
        /// Positional arguments in source order.
        args: Vec<ObjectId>,
        /// Keyword arguments, keyed by argument-slot index.
        kwargs: BTreeMap<u32, ObjectId>,
    },

    /// A symbolic binary-operator expression. The operator tag is carried
    /// unevaluated.
    Operation {
        /// Operator spelling (`"+"`, `"%"`, `"or"`, ...).
        op: String,
        /// Left operand.
        lhs: ObjectId,
        /// Right operand.
        rhs: ObjectId,
    },

    /// A symbolic unary-operator expression.
    UnaryOperation {
        /// Operator spelling (`"-"`, `"not"`, `"~"`).
        op: String,
        /// The operand.
        operand: ObjectId,
    },

    /// A symbolic comparison expression.
    Compare {
        /// Comparison spelling (`">"`, `"=="`, ...).
        op: String,
        /// Left operand.
        lhs: ObjectId,
        /// Right operand.
        rhs: ObjectId,
    },

    /// The branch-merge node: a value that differs depending on which path
    /// condition held, plus an optional fallback.
    ///
    /// Outcomes are kept most-recently-added first; when several outcomes
    /// could apply to the same name, the front one takes precedence,
    /// modeling "last conditional store wins".
    PossibleOutcomes {
        /// The recorded branch outcomes, most recent first.
        outcomes: Vec<Outcome>,
        /// The value when no recorded condition holds.
        else_outcome: Option<ObjectId>,
    },

    /// A loop-carried value summary.
    ///
    /// Structural only: the dispatcher never constructs this variant. The
    /// loop boundary recognizer locates candidate loops, but merging
    /// loop-carried modifications into the environments is a defined,
    /// unimplemented extension seam.
    WhileLoop {
        /// Pre-loop snapshot of the global-like environment.
        base_values: BTreeMap<String, ObjectId>,
        /// Pre-loop snapshot of the local-like environment.
        base_values_fast: BTreeMap<String, ObjectId>,
        /// Modifications observed against the loop body.
        modifications: Vec<LoopModification>,
        /// The loop's guard condition.
        condition: ObjectId,
    },
}

impl AbstractValue {
    /// Returns `true` if this is the uninformative [`AbstractValue::Unknown`].
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns `true` if this is a branch-merge node.
    #[must_use]
    pub const fn is_possible_outcomes(&self) -> bool {
        matches!(self, Self::PossibleOutcomes { .. })
    }

    /// Returns the carried literal if this is a known constant.
    #[must_use]
    pub const fn as_literal(&self) -> Option<&Literal> {
        match self {
            Self::Value { value } => Some(value),
            _ => None,
        }
    }
}

/// One object in the arena: a value variant plus its attribute overlay.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AbstractObject {
    value: AbstractValue,
    attrs: BTreeMap<String, ObjectId>,
}

impl Default for AbstractValue {
    fn default() -> Self {
        Self::Unknown
    }
}

impl AbstractObject {
    /// Creates an object with an empty overlay.
    #[must_use]
    pub const fn new(value: AbstractValue) -> Self {
        Self {
            value,
            attrs: BTreeMap::new(),
        }
    }

    /// Returns the value variant.
    #[must_use]
    pub const fn value(&self) -> &AbstractValue {
        &self.value
    }

    /// Returns the attribute overlay.
    #[must_use]
    pub const fn attrs(&self) -> &BTreeMap<String, ObjectId> {
        &self.attrs
    }
}

/// Arena owning every [`AbstractObject`] of one analysis run.
///
/// Objects are allocated once and addressed by [`ObjectId`]; they are never
/// freed during a run. The arena is a pure value: cloning it (as part of an
/// execution-state snapshot) shares no mutable substructure with the
/// original.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueArena {
    objects: Vec<AbstractObject>,
}

impl ValueArena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of objects allocated so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no object has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocates a new object with an empty attribute overlay.
    pub fn alloc(&mut self, value: AbstractValue) -> ObjectId {
        let id = ObjectId::new(self.objects.len());
        self.objects.push(AbstractObject::new(value));
        id
    }

    /// Returns the object behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> &AbstractObject {
        &self.objects[id.index()]
    }

    /// Returns the object behind `id`, or `None` for a foreign id.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&AbstractObject> {
        self.objects.get(id.index())
    }

    /// Returns the value variant behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this arena.
    #[must_use]
    pub fn value(&self, id: ObjectId) -> &AbstractValue {
        &self.objects[id.index()].value
    }

    /// Returns `true` if the object behind `id` is a branch-merge node.
    #[must_use]
    pub fn is_possible_outcomes(&self, id: ObjectId) -> bool {
        self.value(id).is_possible_outcomes()
    }

    /// Reads an attribute off an object.
    ///
    /// Never fails: an overlay hit returns the recorded object, a miss
    /// allocates and returns a fresh [`AbstractValue::Unknown`]. The miss is
    /// not recorded in the overlay; only explicit assignment populates it.
    pub fn get_attr(&mut self, id: ObjectId, attr: &str) -> ObjectId {
        if let Some(&value) = self.objects[id.index()].attrs.get(attr) {
            return value;
        }
        self.alloc(AbstractValue::Unknown)
    }

    /// Returns the overlay entry for an attribute without allocating.
    #[must_use]
    pub fn modified_attr(&self, id: ObjectId, attr: &str) -> Option<ObjectId> {
        self.objects[id.index()].attrs.get(attr).copied()
    }

    /// Records an attribute assignment, overwriting any prior overlay entry.
    pub fn set_attr(&mut self, id: ObjectId, attr: &str, value: ObjectId) {
        self.objects[id.index()]
            .attrs
            .insert(attr.to_string(), value);
    }

    /// Removes an attribute from an object's overlay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AttributeNotFound`] if the attribute was never set.
    /// This is a recoverable, local condition; the run may continue.
    pub fn remove_modified_attr(&mut self, id: ObjectId, attr: &str) -> Result<ObjectId> {
        self.objects[id.index()]
            .attrs
            .remove(attr)
            .ok_or_else(|| Error::AttributeNotFound {
                name: attr.to_string(),
            })
    }

    /// Inserts an outcome at the front of a branch-merge node.
    ///
    /// Returns `false` (and records nothing) if the object behind `id` is
    /// not a [`AbstractValue::PossibleOutcomes`].
    pub fn add_outcome(&mut self, id: ObjectId, outcome: Outcome) -> bool {
        match &mut self.objects[id.index()].value {
            AbstractValue::PossibleOutcomes { outcomes, .. } => {
                outcomes.insert(0, outcome);
                true
            }
            _ => false,
        }
    }

    /// Returns a cycle-safe [`fmt::Display`] adaptor for the object behind
    /// `id`.
    #[must_use]
    pub const fn display(&self, id: ObjectId) -> ObjectDisplay<'_> {
        ObjectDisplay { arena: self, id }
    }

    fn fmt_object(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: ObjectId,
        path: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        let Some(object) = self.get(id) else {
            return write!(f, "<foreign {id}>");
        };
        if path.contains(&id) {
            return write!(f, "<cycle {id}>");
        }
        path.push(id);
        let result = self.fmt_value(f, object, path);
        path.pop();
        result
    }

    fn fmt_value(
        &self,
        f: &mut fmt::Formatter<'_>,
        object: &AbstractObject,
        path: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        match &object.value {
            AbstractValue::Unknown => {
                write!(f, "unknown")?;
                if !object.attrs.is_empty() {
                    write!(f, "(")?;
                    self.fmt_attrs(f, object, path)?;
                    write!(f, ")")?;
                }
                Ok(())
            }
            AbstractValue::UnknownName { name } => {
                write!(f, "unknown-name({name}")?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::UnknownFastName { name } => {
                write!(f, "unknown-fast-name({name}")?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::Value { value } => {
                write!(f, "value({value}")?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::Attribute { base, name, value } => {
                write!(f, "attribute(")?;
                self.fmt_object(f, *base, path)?;
                write!(f, ".{name} = ")?;
                self.fmt_object(f, *value, path)?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::Module { name } => {
                write!(f, "module({name}")?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::BuiltIn { name } => {
                write!(f, "builtin({name}")?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::Call {
                callee,
                args,
                kwargs,
            } => {
                write!(f, "call(")?;
                self.fmt_object(f, *callee, path)?;
                for arg in args {
                    write!(f, ", ")?;
                    self.fmt_object(f, *arg, path)?;
                }
                for (slot, value) in kwargs {
                    write!(f, ", {slot}=")?;
                    self.fmt_object(f, *value, path)?;
                }
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::Operation { op, lhs, rhs } => {
                write!(f, "operation(")?;
                self.fmt_object(f, *lhs, path)?;
                write!(f, " {op} ")?;
                self.fmt_object(f, *rhs, path)?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::UnaryOperation { op, operand } => {
                write!(f, "unary({op} ")?;
                self.fmt_object(f, *operand, path)?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::Compare { op, lhs, rhs } => {
                write!(f, "compare(")?;
                self.fmt_object(f, *lhs, path)?;
                write!(f, " {op} ")?;
                self.fmt_object(f, *rhs, path)?;
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::PossibleOutcomes {
                outcomes,
                else_outcome,
            } => {
                write!(f, "possibility(")?;
                for (i, outcome) in outcomes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    self.fmt_outcome(f, outcome, path)?;
                }
                if let Some(fallback) = else_outcome {
                    if !outcomes.is_empty() {
                        write!(f, ", ")?;
                    }
                    write!(f, "else -> ")?;
                    self.fmt_object(f, *fallback, path)?;
                }
                self.fmt_attrs_tail(f, object, path)
            }
            AbstractValue::WhileLoop {
                modifications,
                condition,
                ..
            } => {
                write!(f, "while-loop(")?;
                self.fmt_object(f, *condition, path)?;
                write!(f, ", {} modifications", modifications.len())?;
                self.fmt_attrs_tail(f, object, path)
            }
        }
    }

    fn fmt_outcome(
        &self,
        f: &mut fmt::Formatter<'_>,
        outcome: &Outcome,
        path: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        write!(f, "outcome(")?;
        if outcome.conditions.is_empty() {
            self.fmt_object(f, outcome.outcome, path)?;
        } else {
            for (i, condition) in outcome.conditions.iter().enumerate() {
                if i > 0 {
                    write!(f, " && ")?;
                }
                self.fmt_object(f, *condition, path)?;
            }
            write!(f, " -> ")?;
            self.fmt_object(f, outcome.outcome, path)?;
        }
        write!(f, ")")
    }

    fn fmt_attrs_tail(
        &self,
        f: &mut fmt::Formatter<'_>,
        object: &AbstractObject,
        path: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        if !object.attrs.is_empty() {
            write!(f, ", ")?;
            self.fmt_attrs(f, object, path)?;
        }
        write!(f, ")")
    }

    fn fmt_attrs(
        &self,
        f: &mut fmt::Formatter<'_>,
        object: &AbstractObject,
        path: &mut Vec<ObjectId>,
    ) -> fmt::Result {
        write!(f, "attrs: {{")?;
        for (i, (name, value)) in object.attrs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}: ")?;
            self.fmt_object(f, *value, path)?;
        }
        write!(f, "}}")
    }
}

/// Cycle-safe rendering of one arena object.
///
/// Produced by [`ValueArena::display`]. Traversal tracks the path of visited
/// ids and prints a `<cycle oN>` marker instead of recursing into an object
/// already on the path.
pub struct ObjectDisplay<'a> {
    arena: &'a ValueArena,
    id: ObjectId,
}

impl fmt::Display for ObjectDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut path = Vec::new();
        self.arena.fmt_object(f, self.id, &mut path)
    }
}
