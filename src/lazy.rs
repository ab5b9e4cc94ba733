use std::{cell::RefCell, fmt, rc::Rc};

/// Deferred computation run against a context `C` when first forced.
pub type Thunk<C, T, E> = Rc<dyn Fn(&mut C) -> Result<T, E>>;

enum State<C: ?Sized, T, E> {
    Deferred(Thunk<C, T, E>),
    Forcing,
    Ready(T),
}

/// A memo cell: computes its value on the first successful [`Lazy::force`]
/// and hands out the cached result from then on.
///
/// A computation that fails leaves the cell deferred, so the next force runs
/// it again. Forcing a cell from inside its own computation is reported
/// through the `on_cycle` callback instead of recursing.
pub struct Lazy<C: ?Sized, T, E> {
    state: RefCell<State<C, T, E>>,
}

impl<C: ?Sized, T: Clone, E> Lazy<C, T, E> {
    pub fn new(thunk: impl Fn(&mut C) -> Result<T, E> + 'static) -> Self {
        Self {
            state: RefCell::new(State::Deferred(Rc::new(thunk))),
        }
    }

    pub fn ready(value: T) -> Self {
        Self {
            state: RefCell::new(State::Ready(value)),
        }
    }

    pub fn is_forced(&self) -> bool {
        matches!(&*self.state.borrow(), State::Ready(_))
    }

    pub fn is_forcing(&self) -> bool {
        matches!(&*self.state.borrow(), State::Forcing)
    }

    /// The memoized value, if the cell has been forced successfully.
    pub fn get(&self) -> Option<T> {
        match &*self.state.borrow() {
            State::Ready(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn force(&self, ctx: &mut C, on_cycle: impl FnOnce() -> E) -> Result<T, E> {
        let thunk = match &*self.state.borrow() {
            State::Ready(value) => return Ok(value.clone()),
            State::Forcing => return Err(on_cycle()),
            State::Deferred(thunk) => Rc::clone(thunk),
        };
        *self.state.borrow_mut() = State::Forcing;
        let result = thunk(ctx);
        let mut state = self.state.borrow_mut();
        match result {
            Ok(value) => {
                *state = State::Ready(value.clone());
                Ok(value)
            }
            Err(err) => {
                *state = State::Deferred(thunk);
                Err(err)
            }
        }
    }
}

impl<C: ?Sized, T: fmt::Debug, E> fmt::Debug for Lazy<C, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.borrow() {
            State::Deferred(_) => write!(f, "Lazy(<deferred>)"),
            State::Forcing => write!(f, "Lazy(<forcing>)"),
            State::Ready(value) => f.debug_tuple("Lazy").field(value).finish(),
        }
    }
}
