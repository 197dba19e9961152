//! `java/util/Random`
//!
//! Each instance owns one generator behind a mutex. Native methods pop their
//! arguments, take the lock for exactly one draw, release it, and only then
//! push the result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use brew_core::{
    AccessFlags, BuildError, Class, ClassBuilder, NativeError, NativeResult, NativeState,
    Reference, TypeDescriptor,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Internal name of the Random class
pub const RANDOM_CLASS: &str = "java/util/Random";

/// Mixed into clock seeds so generators created in the same tick differ
static SEED_UNIQUIFIER: AtomicU64 = AtomicU64::new(0x1ED8_B55F_AC9D_EC);

fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let unique = SEED_UNIQUIFIER.fetch_add(0x9E37_79B9_7F4A_7C15, Ordering::Relaxed);
    nanos ^ unique
}

/// Native state of a Random instance
#[derive(Debug)]
pub struct RandomState {
    rng: Mutex<StdRng>,
}

impl NativeState for RandomState {}

impl RandomState {
    /// Generator with a fixed seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Generator seeded from the wall clock
    pub fn from_clock() -> Self {
        Self::from_seed(clock_seed())
    }

    /// Uniform `int` over the whole range
    pub fn next_int(&self) -> i32 {
        self.rng.lock().gen()
    }

    /// Uniform `int` in `0..bound`
    ///
    /// # Errors
    ///
    /// `GuestException::IllegalArgument` if `bound <= 0`. The generator is
    /// not touched in that case.
    pub fn next_int_bounded(&self, bound: i32) -> NativeResult<i32> {
        if bound <= 0 {
            return Err(NativeError::illegal_argument(format!(
                "bound must be positive, got {}",
                bound
            )));
        }
        Ok(self.rng.lock().gen_range(0..bound))
    }

    /// Uniform `long`
    pub fn next_long(&self) -> i64 {
        self.rng.lock().gen()
    }

    /// Fair coin
    pub fn next_boolean(&self) -> bool {
        self.rng.lock().gen()
    }

    /// Restart the sequence from `seed`
    pub fn set_seed(&self, seed: u64) {
        *self.rng.lock() = StdRng::seed_from_u64(seed);
    }
}

fn state(this: &Reference) -> NativeResult<&RandomState> {
    this.expect_instance(RANDOM_CLASS)?.native_state::<RandomState>()
}

/// Build the Random class
///
/// With `fixed_seed` set, the no-argument constructor seeds every new
/// generator with it instead of the clock.
pub fn build_class(fixed_seed: Option<u64>) -> Result<Arc<Class>, BuildError> {
    let mut builder = ClassBuilder::new(RANDOM_CLASS);

    builder
        .add_native_method(
            "<init>",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Void,
            move |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                let state = match fixed_seed {
                    Some(seed) => RandomState::from_seed(seed),
                    None => RandomState::from_clock(),
                };
                this.expect_instance(RANDOM_CLASS)?.init_native_state(state)
            },
        )?
        .add_void_method("<init>", TypeDescriptor::Long, |thread| {
            let (this, (seed,)) = thread.pop_instance_call::<(i64,)>()?;
            this.expect_instance(RANDOM_CLASS)?
                .init_native_state(RandomState::from_seed(seed as u64))
        })?
        .add_native_method(
            "nextInt",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Int,
            |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                let value = state(&this)?.next_int();
                thread.push_result(value)
            },
        )?
        .add_native_method(
            "nextInt",
            AccessFlags::PUBLIC,
            vec![TypeDescriptor::Int],
            TypeDescriptor::Int,
            |thread| {
                let (this, (bound,)) = thread.pop_instance_call::<(i32,)>()?;
                let value = state(&this)?.next_int_bounded(bound)?;
                thread.push_result(value)
            },
        )?
        .add_native_method(
            "nextLong",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Long,
            |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                let value = state(&this)?.next_long();
                thread.push_result(value)
            },
        )?
        .add_native_method(
            "nextBoolean",
            AccessFlags::PUBLIC,
            vec![],
            TypeDescriptor::Boolean,
            |thread| {
                let (this, ()) = thread.pop_instance_call::<()>()?;
                let value = state(&this)?.next_boolean();
                thread.push_result(value)
            },
        )?
        .add_void_method("setSeed", TypeDescriptor::Long, |thread| {
            let (this, (seed,)) = thread.pop_instance_call::<(i64,)>()?;
            state(&this)?.set_seed(seed as u64);
            Ok(())
        })?;

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use brew_core::{GuestException, MethodKey, Value, VmThread};

    fn call(class: &Class, thread: &mut VmThread, name: &str, descriptor: &str) -> NativeResult<()> {
        let key = MethodKey::parse(name, descriptor).unwrap();
        class.method(&key).unwrap().invoke(thread)
    }

    fn seeded(class: &Arc<Class>, seed: i64) -> Reference {
        let random = Reference::new_instance(class);
        let mut thread = VmThread::new();
        thread.push_result(random.clone()).unwrap();
        thread.push_result(seed).unwrap();
        call(class, &mut thread, "<init>", "(J)V").unwrap();
        random
    }

    #[test]
    fn test_method_table() {
        let class = build_class(None).unwrap();
        assert_eq!(class.name(), RANDOM_CLASS);
        assert_eq!(class.method_count(), 7);
        assert!(class.methods().all(|m| m.is_prepared() && m.access().is_native()));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let a = RandomState::from_seed(42);
        let b = RandomState::from_seed(42);
        for _ in 0..16 {
            assert_eq!(a.next_int(), b.next_int());
        }
    }

    #[test]
    fn test_bounded_rejects_non_positive() {
        let state = RandomState::from_seed(1);
        for bound in [0, -1, i32::MIN] {
            let err = state.next_int_bounded(bound).unwrap_err();
            assert!(matches!(err, NativeError::Guest(GuestException::IllegalArgument(_))));
        }
    }

    #[test]
    fn test_bounded_range() {
        let state = RandomState::from_seed(9);
        for bound in [1, 2, 7, 1000, i32::MAX] {
            for _ in 0..200 {
                let v = state.next_int_bounded(bound).unwrap();
                assert!((0..bound).contains(&v));
            }
        }
    }

    #[test]
    fn test_next_int_through_stack() {
        let class = build_class(None).unwrap();
        let random = seeded(&class, 5);
        let expected = RandomState::from_seed(5).next_int();

        let mut thread = VmThread::new();
        thread.push_result(random).unwrap();
        call(&class, &mut thread, "nextInt", "()I").unwrap();
        assert_eq!(thread.stack_mut().pop().unwrap(), Value::Int(expected));
        assert!(thread.stack().is_empty());
    }

    #[test]
    fn test_set_seed_restarts_sequence() {
        let class = build_class(None).unwrap();
        let random = seeded(&class, 3);
        let mut thread = VmThread::new();

        thread.push_result(random.clone()).unwrap();
        call(&class, &mut thread, "nextLong", "()J").unwrap();
        let first = thread.stack_mut().pop().unwrap();

        thread.push_result(random.clone()).unwrap();
        thread.push_result(3i64).unwrap();
        call(&class, &mut thread, "setSeed", "(J)V").unwrap();

        thread.push_result(random).unwrap();
        call(&class, &mut thread, "nextLong", "()J").unwrap();
        assert_eq!(thread.stack_mut().pop().unwrap(), first);
    }

    #[test]
    fn test_fixed_seed_option() {
        let class = build_class(Some(11)).unwrap();
        let random = Reference::new_instance(&class);
        let mut thread = VmThread::new();
        thread.push_result(random.clone()).unwrap();
        call(&class, &mut thread, "<init>", "()V").unwrap();

        thread.push_result(random).unwrap();
        call(&class, &mut thread, "nextBoolean", "()Z").unwrap();
        let expected = RandomState::from_seed(11).next_boolean();
        assert_eq!(thread.stack_mut().pop().unwrap(), Value::Int(expected as i32));
    }

    #[test]
    fn test_clock_seeds_differ() {
        assert_ne!(clock_seed(), clock_seed());
    }
}
