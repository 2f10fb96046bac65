#![allow(unused_macros)]

/// Helper macro for locking items, propagating poisoning as [`crate::Error::LockError`]
///
/// ```rust, ignore
///  let _guard = lock!(self.build_lock);
/// ```
macro_rules! lock {
    ($lock:expr) => {
        $lock.lock().map_err(|_| crate::Error::LockError)?
    };
}

/// Helper macro for reading locked items
///
/// ```rust, ignore
///  let value = read_lock!(slot).clone();
/// ```
macro_rules! read_lock {
    ($rwlock:expr) => {
        $rwlock.read().map_err(|_| crate::Error::LockError)?
    };
}

/// Helper macro for writing to locked items
///
/// ```rust, ignore
///  *write_lock!(slot) = value;
/// ```
macro_rules! write_lock {
    ($rwlock:expr) => {
        $rwlock.write().map_err(|_| crate::Error::LockError)?
    };
}

/// Build a `Vec<Value>` from a list of expressions convertible into [`crate::Value`].
///
/// ```rust
/// use memberscope::{values, Value};
///
/// let args = values![3, "three", 3.0_f64];
/// assert_eq!(args[0], Value::I4(3));
/// assert_eq!(args[1], Value::String("three".to_string()));
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! values {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($arg)),+]
    };
}
