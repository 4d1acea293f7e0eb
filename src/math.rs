/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// An insertion-ordered set. The alphabet and state set of an automaton keep the order
/// in which their elements were declared, which both codecs rely on for stable output.
pub type OrderedSet<S> = indexmap::IndexSet<S>;
/// An insertion-ordered map, used for the transition table so that exports are deterministic.
pub type OrderedMap<K, V> = indexmap::IndexMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;
