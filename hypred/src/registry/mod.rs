//! Class registry
//!
//! Predicates refer to classes, fields and methods by name. This module is the
//! host-neutral stand-in for a reflective environment: a [`ClassRegistry`]
//! holds every known [`ClassInfo`] and answers the questions the predicate
//! builder and evaluator ask:
//!
//! - name lookup, honoring a configurable list of default packages,
//! - assignability between classes (superclass chains, interfaces, `Object`),
//! - inherited field and method lookup, including overload sets.
//!
//! The builtin pool (see `builtin.rs`) is installed by [`ClassRegistry::new`] and
//! always occupies the identifiers exposed as constants on [`ClassId`]. Further
//! classes are declared with a [`ClassBuilder`], one at a time or as a batch of
//! mutually referring classes.

mod builder;
mod builtin;

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    fmt,
    sync::Arc,
};

use either::Either;
use log::debug;
use parking_lot::RwLock;
use smallvec::SmallVec;
use strum::EnumIs;

pub use builder::ClassBuilder;

use crate::{
    utils::{Error, EvalResult},
    value::Value,
};

/// Packages searched when a class is referred to by its simple name.
pub const DEFAULT_PACKAGES: [&str; 2] = ["java.lang.", "java.util."];

/// Stable handle of a class inside a [`ClassRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const OBJECT: ClassId = ClassId(0);
    pub const BOOLEAN: ClassId = ClassId(1);
    pub const BYTE: ClassId = ClassId(2);
    pub const CHAR: ClassId = ClassId(3);
    pub const SHORT: ClassId = ClassId(4);
    pub const INT: ClassId = ClassId(5);
    pub const LONG: ClassId = ClassId(6);
    pub const FLOAT: ClassId = ClassId(7);
    pub const DOUBLE: ClassId = ClassId(8);
    pub const STRING: ClassId = ClassId(9);
    pub const COLLECTION: ClassId = ClassId(10);
    pub const LIST: ClassId = ClassId(11);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIs)]
pub enum ClassKind {
    Class,
    Interface,
    Primitive,
}

/// Native implementation of a method: receives the receiver (or
/// [`Value::Null`] for static methods) and the already evaluated arguments.
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> EvalResult<Value> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub owner: ClassId,
    pub name: String,
    pub ty: ClassId,
    pub is_static: bool,
    pub is_final: bool,
    /// Value of a static field.
    pub value: Option<Value>,
}

impl PartialEq for FieldInfo {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.name == other.name
    }
}

#[derive(Clone)]
pub struct MethodInfo {
    pub owner: ClassId,
    pub name: String,
    pub params: SmallVec<ClassId, 2>,
    pub ret: ClassId,
    pub is_static: bool,
    pub invoker: Invoker,
}

impl MethodInfo {
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> EvalResult<Value> {
        (self.invoker)(receiver, args)
    }

    fn same_signature(&self, other: &MethodInfo) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInfo")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}

impl PartialEq for MethodInfo {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.same_signature(other)
    }
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub id: ClassId,
    /// Fully qualified name, e.g. `java.util.List`.
    pub name: String,
    pub kind: ClassKind,
    pub is_final: bool,
    pub superclass: Option<ClassId>,
    pub interfaces: SmallVec<ClassId, 2>,
    pub fields: Vec<Arc<FieldInfo>>,
    pub methods: Vec<Arc<MethodInfo>>,
}

impl ClassInfo {
    pub fn is_interface(&self) -> bool {
        self.kind.is_interface()
    }

    pub fn is_primitive(&self) -> bool {
        self.kind.is_primitive()
    }
}

/// Thread-safe store of class metadata.
///
/// A registry is a view over a shared pool of classes together with the
/// packages searched for simple names. [`Self::with_packages`] creates a
/// second view on the same pool: classes defined through either view are
/// visible to both, while each view keeps its own packages.
///
/// # Example
/// ```
/// use hypred::registry::{ClassId, ClassRegistry};
///
/// let registry = ClassRegistry::new();
/// let list = registry.lookup("List").unwrap();
/// assert_eq!(list, ClassId::LIST);
/// assert!(registry.is_assignable(ClassId::COLLECTION, list));
/// assert!(registry.is_assignable(ClassId::OBJECT, list));
/// assert!(!registry.is_assignable(ClassId::OBJECT, ClassId::INT));
///
/// let bare = registry.with_packages(["java.lang."]);
/// assert!(bare.lookup("List").is_none());
/// assert_eq!(bare.lookup("java.util.List"), Some(list));
/// ```
///
/// The pool lock is never held across calls into method invokers.
#[derive(Clone)]
pub struct ClassRegistry {
    pool: Arc<RwLock<ClassPool>>,
    packages: Arc<[String]>,
}

#[derive(Default)]
struct ClassPool {
    by_name: BTreeMap<String, ClassId>,
    classes: Vec<Arc<ClassInfo>>,
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.len())
            .field("packages", &self.packages)
            .finish()
    }
}

fn lookup_in(by_name: &BTreeMap<String, ClassId>, packages: &[String], name: &str) -> Option<ClassId> {
    if let Some(id) = by_name.get(name) {
        return Some(*id);
    }
    if name.contains('.') {
        return None;
    }
    packages
        .iter()
        .find_map(|package| by_name.get(&format!("{package}{name}")).copied())
}

/// Package prefix of a qualified class name, e.g. `demo.` for `demo.Person`.
fn package_of(name: &str) -> Option<&str> {
    name.rfind('.').map(|pos| &name[..=pos])
}

impl ClassRegistry {
    /// Creates a registry holding the builtin class pool.
    pub fn new() -> Self {
        match Self::try_new() {
            Ok(registry) => registry,
            // The builtin pool is fixed; `builtin_pool_installs` covers it.
            Err(err) => unreachable!("the builtin class pool is inconsistent: {err}"),
        }
    }

    /// Creates a registry holding the builtin class pool, reporting any
    /// inconsistency in the pool as an error.
    pub fn try_new() -> Result<Self, Error> {
        let registry = Self {
            pool: Default::default(),
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
        };
        builtin::install(&registry)?;
        Ok(registry)
    }

    /// A view on the same classes that searches `packages` for simple class
    /// names. Each package is a prefix including its trailing separator,
    /// e.g. `"java.util."`.
    pub fn with_packages(&self, packages: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let packages: Arc<[String]> = packages.into_iter().map(Into::into).collect();
        debug!("Created a registry view searching {packages:?}");
        Self {
            pool: Arc::clone(&self.pool),
            packages,
        }
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.pool.read().classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.read().classes.is_empty()
    }

    pub fn get(&self, id: ClassId) -> Option<Arc<ClassInfo>> {
        self.pool.read().classes.get(id.0 as usize).cloned()
    }

    /// Looks a class up by fully qualified name, or by simple name inside one
    /// of the packages of this view.
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        lookup_in(&self.pool.read().by_name, &self.packages, name)
    }

    /// Like [`Self::lookup`] but reports unknown names as [`Error::UnknownClass`].
    pub fn resolve(&self, name: &str) -> Result<ClassId, Error> {
        self.lookup(name).ok_or_else(|| Error::UnknownClass {
            name: name.to_string(),
        })
    }

    /// Fully qualified name of a class, `<unknown>` for foreign identifiers.
    pub fn name(&self, id: ClassId) -> String {
        self.get(id)
            .map(|info| info.name.clone())
            .unwrap_or_else(|| "<unknown>".to_string())
    }

    /// Name used when printing: qualified when `verbose`, otherwise with any
    /// default package prefix stripped.
    pub fn display_name(&self, id: ClassId, verbose: bool) -> String {
        let name = self.name(id);
        if verbose {
            return name;
        }
        let Some(pos) = name.rfind('.') else {
            return name;
        };
        let prefix = &name[..=pos];
        if self.packages.iter().any(|package| package == prefix) {
            name[pos + 1..].to_string()
        } else {
            name
        }
    }

    pub fn is_interface(&self, id: ClassId) -> bool {
        self.get(id).is_some_and(|info| info.is_interface())
    }

    pub fn is_final(&self, id: ClassId) -> bool {
        self.get(id).is_some_and(|info| info.is_final)
    }

    pub fn is_primitive(&self, id: ClassId) -> bool {
        self.get(id).is_some_and(|info| info.is_primitive())
    }

    /// Whether a value of class `from` may be used where `to` is expected.
    ///
    /// Every class is assignable to itself. Primitives are assignable to
    /// nothing else, and every other class or interface is assignable to
    /// `Object`.
    pub fn is_assignable(&self, to: ClassId, from: ClassId) -> bool {
        if to == from {
            return true;
        }
        let Some(from_info) = self.get(from) else {
            return false;
        };
        if from_info.is_primitive() || self.get(to).is_none_or(|info| info.is_primitive()) {
            return false;
        }
        if to == ClassId::OBJECT {
            return true;
        }

        let mut seen = BTreeSet::new();
        let mut pending: SmallVec<ClassId, 8> = SmallVec::new();
        pending.push(from);
        while let Some(id) = pending.pop() {
            if id == to {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(info) = self.get(id) {
                pending.extend(info.superclass);
                pending.extend(info.interfaces.iter().copied());
            }
        }
        false
    }

    /// The class followed by its superclass chain, then every implemented
    /// interface breadth first. Each class appears once.
    fn lineage(&self, id: ClassId) -> Vec<Arc<ClassInfo>> {
        let mut seen = BTreeSet::new();
        let mut lineage = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(info) = self.get(current).filter(|_| seen.insert(current)) else {
                break;
            };
            cursor = info.superclass;
            lineage.push(info);
        }

        let mut pending: VecDeque<ClassId> = lineage
            .iter()
            .flat_map(|info| info.interfaces.iter().copied())
            .collect();
        while let Some(current) = pending.pop_front() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(info) = self.get(current) {
                pending.extend(info.interfaces.iter().copied());
                lineage.push(info);
            }
        }
        lineage
    }

    fn collect_methods(&self, class: ClassId, name: &str, is_static: Option<bool>) -> Vec<Arc<MethodInfo>> {
        let mut found: Vec<Arc<MethodInfo>> = Vec::new();
        for info in self.lineage(class) {
            for method in &info.methods {
                if method.name != name || is_static.is_some_and(|s| s != method.is_static) {
                    continue;
                }
                if !found.iter().any(|known| known.same_signature(method)) {
                    found.push(method.clone());
                }
            }
        }
        found
    }

    /// Public methods called `name` reachable from `class` (inherited ones
    /// included, overridden ones hidden). Returns a single method when the
    /// name is not overloaded, otherwise the whole overload set.
    pub fn methods_named(
        &self,
        class: ClassId,
        name: &str,
        is_static: bool,
    ) -> Option<Either<Arc<MethodInfo>, Vec<Arc<MethodInfo>>>> {
        let mut found = self.collect_methods(class, name, Some(is_static));
        match found.len() {
            0 => None,
            1 => found.pop().map(Either::Left),
            _ => Some(Either::Right(found)),
        }
    }

    /// The method with exactly the given parameter classes.
    pub fn method_exact(
        &self,
        class: ClassId,
        name: &str,
        params: &[ClassId],
        is_static: bool,
    ) -> Option<Arc<MethodInfo>> {
        self.collect_methods(class, name, Some(is_static))
            .into_iter()
            .find(|method| method.params.as_slice() == params)
    }

    /// Whether `class` exposes more than one method called `name`.
    pub fn is_overloaded(&self, class: ClassId, name: &str) -> bool {
        self.collect_methods(class, name, None).len() > 1
    }

    pub fn field(&self, class: ClassId, name: &str, is_static: bool) -> Option<Arc<FieldInfo>> {
        self.lineage(class).into_iter().find_map(|info| {
            info.fields
                .iter()
                .find(|field| field.name == name && field.is_static == is_static)
                .cloned()
        })
    }

    /// Class of a runtime value, `None` for null.
    pub fn class_of(&self, value: &Value) -> Option<ClassId> {
        value.class()
    }

    /// Registers a new class and returns its identifier.
    ///
    /// Type names used by the builder are resolved at this point, see
    /// [`Self::define_all`].
    pub fn define(&self, builder: ClassBuilder) -> Result<ClassId, Error> {
        let name = builder.name.clone();
        self.define_all([builder])?
            .pop()
            .ok_or(Error::UnknownClass { name })
    }

    /// Registers a batch of classes at once and returns their identifiers in
    /// order.
    ///
    /// Every class of the batch is known before any type name is resolved,
    /// so classes may refer to each other and to themselves. Simple names are
    /// searched in the packages of this view and in the package of the class
    /// being defined. Nothing is registered when any class fails.
    pub fn define_all(&self, builders: impl IntoIterator<Item = ClassBuilder>) -> Result<Vec<ClassId>, Error> {
        let builders: Vec<ClassBuilder> = builders.into_iter().collect();
        let mut pool = self.pool.write();
        let base = pool.classes.len();

        let mut pending: BTreeMap<String, ClassId> = BTreeMap::new();
        for (offset, builder) in builders.iter().enumerate() {
            let id = ClassId((base + offset) as u32);
            if pool.by_name.contains_key(&builder.name) || pending.insert(builder.name.clone(), id).is_some() {
                return Err(Error::DuplicateClass {
                    name: builder.name.clone(),
                });
            }
        }

        let kind_of = |target: ClassId| -> Option<(ClassKind, bool)> {
            let index = target.0 as usize;
            match index.checked_sub(base) {
                Some(offset) => builders.get(offset).map(|b| (b.kind, b.is_final)),
                None => pool.classes.get(index).map(|info| (info.kind, info.is_final)),
            }
        };

        let mut infos = Vec::with_capacity(builders.len());
        for (offset, builder) in builders.iter().enumerate() {
            let id = ClassId((base + offset) as u32);
            let mut packages = self.packages.to_vec();
            packages.extend(package_of(&builder.name).map(str::to_string));
            let resolve = |name: &str| -> Result<ClassId, Error> {
                lookup_in(&pool.by_name, &packages, name)
                    .or_else(|| lookup_in(&pending, &packages, name))
                    .ok_or_else(|| Error::UnknownClass {
                        name: name.to_string(),
                    })
            };
            infos.push(Self::build_info(id, builder, &resolve, &kind_of)?);
        }
        check_acyclic(&infos, base)?;

        let len = infos.len();
        for info in infos {
            debug!(
                "Registered {:?} `{}` as #{} ({} field(s), {} method(s))",
                info.kind,
                info.name,
                info.id.0,
                info.fields.len(),
                info.methods.len()
            );
            pool.by_name.insert(info.name.clone(), info.id);
            pool.classes.push(Arc::new(info));
        }
        Ok((base..base + len).map(|index| ClassId(index as u32)).collect())
    }

    fn build_info(
        id: ClassId,
        builder: &ClassBuilder,
        resolve: impl Fn(&str) -> Result<ClassId, Error>,
        kind_of: impl Fn(ClassId) -> Option<(ClassKind, bool)>,
    ) -> Result<ClassInfo, Error> {
        let superclass = match (&builder.superclass, builder.kind) {
            (Some(name), ClassKind::Class) => Some(resolve(name.as_str())?),
            (None, ClassKind::Class) if id != ClassId::OBJECT => Some(ClassId::OBJECT),
            (Some(name), _) => {
                return Err(Error::MalformedType {
                    descriptor: builder.name.clone(),
                    reason: format!("only classes may extend `{name}`"),
                });
            }
            (None, _) => None,
        };
        if let Some(parent) = superclass
            && kind_of(parent) != Some((ClassKind::Class, false))
        {
            return Err(Error::MalformedType {
                descriptor: builder.name.clone(),
                reason: "the superclass must be a non-final class".to_string(),
            });
        }

        let mut interfaces = SmallVec::new();
        for name in &builder.interfaces {
            let iface = resolve(name.as_str())?;
            if !matches!(kind_of(iface), Some((ClassKind::Interface, _))) {
                return Err(Error::MalformedType {
                    descriptor: builder.name.clone(),
                    reason: format!("`{name}` is not an interface"),
                });
            }
            interfaces.push(iface);
        }

        let mut fields = Vec::with_capacity(builder.fields.len());
        for field in &builder.fields {
            fields.push(Arc::new(FieldInfo {
                owner: id,
                ty: resolve(field.ty.as_str())?,
                name: field.name.clone(),
                is_static: field.is_static,
                is_final: field.is_final,
                value: field.value.clone(),
            }));
        }

        let mut methods = Vec::with_capacity(builder.methods.len());
        for method in &builder.methods {
            let params = method
                .params
                .iter()
                .map(|param| resolve(param.as_str()))
                .collect::<Result<_, _>>()?;
            methods.push(Arc::new(MethodInfo {
                owner: id,
                ret: resolve(method.ret.as_str())?,
                name: method.name.clone(),
                params,
                is_static: method.is_static,
                invoker: Arc::clone(&method.invoker),
            }));
        }

        Ok(ClassInfo {
            id,
            name: builder.name.clone(),
            kind: builder.kind,
            is_final: builder.is_final,
            superclass,
            interfaces,
            fields,
            methods,
        })
    }
}

/// Rejects superclass or interface cycles among a batch of new classes.
/// Classes registered earlier can only point backwards, so a cycle has to
/// stay inside the batch.
fn check_acyclic(infos: &[ClassInfo], base: usize) -> Result<(), Error> {
    let parents = |info: &ClassInfo| -> Vec<usize> {
        info.superclass
            .iter()
            .chain(info.interfaces.iter())
            .filter_map(|parent| (parent.0 as usize).checked_sub(base))
            .collect()
    };
    for (start, info) in infos.iter().enumerate() {
        let mut seen = BTreeSet::new();
        let mut pending = parents(info);
        while let Some(offset) = pending.pop() {
            if offset == start {
                return Err(Error::MalformedType {
                    descriptor: info.name.clone(),
                    reason: "the class inherits from itself".to_string(),
                });
            }
            if seen.insert(offset)
                && let Some(parent) = infos.get(offset)
            {
                pending.extend(parents(parent));
            }
        }
    }
    Ok(())
}

