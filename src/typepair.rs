use std::collections::HashMap;
use std::fmt::{self, Debug};

use crate::error::{AnisoError, AnisoResult};
use crate::particle::TypeId;

/// Unordered pair of particle types. Stored canonically so that
/// `TypePairKey::new(a, b) == TypePairKey::new(b, a)` and both hash alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypePairKey {
    lo: TypeId,
    hi: TypeId,
}

impl TypePairKey {
    pub fn new(a: TypeId, b: TypeId) -> Self {
        Self {
            lo: a.min(b),
            hi: a.max(b),
        }
    }

    pub fn types(&self) -> (TypeId, TypeId) {
        (self.lo, self.hi)
    }

    pub fn is_self_pair(&self) -> bool {
        self.lo == self.hi
    }
}

impl fmt::Display for TypePairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lo, self.hi)
    }
}

/// What a parameter lookup was keyed on. `mu` of the dipole potential is keyed
/// on a single type, everything else on a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKey {
    Single(TypeId),
    Pair(TypePairKey),
}

/// A required field that resolved to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unresolved {
    pub field: &'static str,
    pub key: ParamKey,
}

/// A per-type-pair parameter record with optional fields.
///
/// `Partial` is what the configuration layer stores: every field may be unset.
/// `resolve` turns an explicit partial plus the defaults into a complete record,
/// or names the first required field that is still missing.
pub trait ParamRecord: Sized + Clone + Debug {
    type Field: Copy + Debug;
    type Partial: Clone + Default + Debug + PartialEq;

    fn set_field(partial: &mut Self::Partial, field: Self::Field, value: f64);

    fn resolve(explicit: &Self::Partial, defaults: &Self::Partial) -> Result<Self, &'static str>;

    /// Domain check on whatever fields are set.
    fn check(partial: &Self::Partial) -> Result<(), String>;
}

// explicit value wins, then default, else the field is unresolved
pub fn pick(explicit: Option<f64>, default: Option<f64>, field: &'static str) -> Result<f64, &'static str> {
    explicit.or(default).ok_or(field)
}

#[derive(Debug, Clone)]
pub struct TypePairTable<R: ParamRecord> {
    explicit: HashMap<TypePairKey, R::Partial>,
    defaults: R::Partial,
}

impl<R: ParamRecord> Default for TypePairTable<R> {
    fn default() -> Self {
        Self {
            explicit: HashMap::new(),
            defaults: R::Partial::default(),
        }
    }
}

impl<R: ParamRecord> TypePairTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: R::Partial) -> Self {
        Self {
            explicit: HashMap::new(),
            defaults,
        }
    }

    /// Stores `record` for `key`, replacing (not merging with) anything set before.
    pub fn set(&mut self, key: TypePairKey, record: R::Partial) -> AnisoResult<()> {
        R::check(&record).map_err(AnisoError::InvalidConfiguration)?;
        self.explicit.insert(key, record);
        Ok(())
    }

    /// Fallback for `field` on every pair that has no explicit value for it.
    pub fn set_default(&mut self, field: R::Field, value: f64) -> AnisoResult<()> {
        let mut defaults = self.defaults.clone();
        R::set_field(&mut defaults, field, value);
        R::check(&defaults).map_err(AnisoError::InvalidConfiguration)?;
        self.defaults = defaults;
        Ok(())
    }

    /// Exactly what was stored for `key`, defaults not applied.
    pub fn explicit(&self, key: TypePairKey) -> Option<&R::Partial> {
        self.explicit.get(&key)
    }

    pub fn defaults(&self) -> &R::Partial {
        &self.defaults
    }

    pub fn get(&self, key: TypePairKey) -> Result<R, Unresolved> {
        let empty = R::Partial::default();
        let explicit = self.explicit.get(&key).unwrap_or(&empty);
        R::resolve(explicit, &self.defaults).map_err(|field| Unresolved {
            field,
            key: ParamKey::Pair(key),
        })
    }
}

/// Parameters keyed on a single type. Kept apart from [`TypePairTable`] so a
/// per-type field can never be confused with a per-pair one.
#[derive(Debug, Clone)]
pub struct TypeTable<T: Clone> {
    field: &'static str,
    explicit: HashMap<TypeId, T>,
    default: Option<T>,
}

impl<T: Clone> TypeTable<T> {
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            explicit: HashMap::new(),
            default: None,
        }
    }

    pub fn set(&mut self, type_id: TypeId, value: T) {
        self.explicit.insert(type_id, value);
    }

    pub fn set_default(&mut self, value: T) {
        self.default = Some(value);
    }

    pub fn explicit(&self, type_id: TypeId) -> Option<&T> {
        self.explicit.get(&type_id)
    }

    pub fn get(&self, type_id: TypeId) -> Result<T, Unresolved> {
        self.explicit
            .get(&type_id)
            .or(self.default.as_ref())
            .cloned()
            .ok_or(Unresolved {
                field: self.field,
                key: ParamKey::Single(type_id),
            })
    }
}

/// Cutoff radius of a type pair, the record behind the `r_cut` table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    pub r_cut: f64,
}

#[derive(Debug, Clone, Copy)]
pub enum CutoffField {
    RCut,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutoffPartial {
    pub r_cut: Option<f64>,
}

impl CutoffPartial {
    pub fn new(r_cut: f64) -> Self {
        Self { r_cut: Some(r_cut) }
    }
}

impl ParamRecord for Cutoff {
    type Field = CutoffField;
    type Partial = CutoffPartial;

    fn set_field(partial: &mut CutoffPartial, field: CutoffField, value: f64) {
        match field {
            CutoffField::RCut => partial.r_cut = Some(value),
        }
    }

    fn resolve(explicit: &CutoffPartial, defaults: &CutoffPartial) -> Result<Self, &'static str> {
        Ok(Self {
            r_cut: pick(explicit.r_cut, defaults.r_cut, "r_cut")?,
        })
    }

    fn check(partial: &CutoffPartial) -> Result<(), String> {
        match partial.r_cut {
            Some(r_cut) if !(r_cut > 0.0 && r_cut.is_finite()) => {
                Err(format!("r_cut must be a positive real, got {r_cut}"))
            }
            _ => Ok(()),
        }
    }
}
