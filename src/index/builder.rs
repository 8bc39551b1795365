use crate::error::Error;
use crate::index::Key;
use crate::index::Static;
#[cfg(feature = "std")]
use crate::index::dynamic::Dynamic;

/// Builder for constructing indexes with custom parameters.
///
/// # Example
///
/// ```
/// use rankline::index::Builder;
///
/// let keys: Vec<u64> = (0..10000).collect();
///
/// let index = Builder::new()
///     .epsilon(128)
///     .epsilon_recursive(8)
///     .build(&keys)
///     .unwrap();
///
/// assert_eq!(index.epsilon(), 128);
/// ```
#[derive(Clone, Debug)]
pub struct Builder {
    epsilon: usize,
    epsilon_recursive: usize,
    #[cfg(feature = "parallel")]
    parallel: bool,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            epsilon: 64,
            epsilon_recursive: 4,
            #[cfg(feature = "parallel")]
            parallel: false,
        }
    }
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error bound for the data level.
    pub fn epsilon(mut self, epsilon: usize) -> Self {
        self.epsilon = epsilon.max(1);
        self
    }

    /// Set the error bound for the upper levels; 0 disables recursion.
    pub fn epsilon_recursive(mut self, epsilon_recursive: usize) -> Self {
        self.epsilon_recursive = epsilon_recursive;
        self
    }

    #[cfg(feature = "parallel")]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build<K: Key>(&self, keys: &[K]) -> Result<Static<K>, Error> {
        #[cfg(feature = "parallel")]
        {
            if self.parallel {
                return Static::new_parallel(keys, self.epsilon, self.epsilon_recursive);
            }
        }

        Static::new(keys, self.epsilon, self.epsilon_recursive)
    }

    #[cfg(feature = "std")]
    pub fn build_dynamic<K: Key, V>(&self, entries: Vec<(K, V)>) -> Result<Dynamic<K, V>, Error> {
        Dynamic::from_sorted(entries, self.epsilon, self.epsilon_recursive)
    }

    #[cfg(feature = "std")]
    pub fn build_dynamic_empty<K: Key, V>(&self) -> Dynamic<K, V> {
        Dynamic::new(self.epsilon, self.epsilon_recursive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn test_builder_default() {
        let builder = Builder::new();
        let keys: Vec<u64> = (0..1000).collect();
        let index = builder.build(&keys).unwrap();

        assert_eq!(index.epsilon(), 64);
        assert_eq!(index.epsilon_recursive(), 4);
    }

    #[test]
    fn test_builder_custom_epsilon() {
        let builder = Builder::new().epsilon(128).epsilon_recursive(8);
        let keys: Vec<u64> = (0..1000).collect();
        let index = builder.build(&keys).unwrap();

        assert_eq!(index.epsilon(), 128);
        assert_eq!(index.epsilon_recursive(), 8);
    }

    #[test]
    fn test_builder_epsilon_floor() {
        let builder = Builder::new().epsilon(0);
        let keys: Vec<u64> = (0..100).collect();
        let index = builder.build(&keys).unwrap();

        assert_eq!(index.epsilon(), 1);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_builder_dynamic() {
        let builder = Builder::new();
        let entries: Vec<(u64, u64)> = (0..100).map(|i| (i, i)).collect();
        let index = builder.build_dynamic(entries).unwrap();

        assert_eq!(index.len(), 100);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_builder_dynamic_empty() {
        let builder = Builder::new();
        let index: crate::Dynamic<u64, u64> = builder.build_dynamic_empty();

        assert!(index.is_empty());
    }
}
