// vim: tw=80
//! How a matched call produces its result.
use std::sync::Arc;

use fragile::Fragile;

use crate::{
    args::CanonicalCall,
    error::{Error, Result},
    value::Value
};

pub(crate) type DoFn =
    Box<dyn FnMut(&CanonicalCall) -> Result<Value> + Send>;

pub(crate) enum Responder {
    /// Always return the same value
    Basic(Value),
    /// Always fail with the same error
    Raise(Arc<dyn std::error::Error + Send + Sync>),
    /// Return each value in turn
    Many {
        values: Vec<Value>,
        index: usize,
        looping: bool,
    },
    /// Compute the result from the call's arguments
    Do(DoFn),
    /// Stands in for a responder that is busy answering a call
    Running,
}

impl Responder {
    pub(crate) fn many(values: Vec<Value>, looping: bool) -> Self {
        Responder::Many{values, index: 0, looping}
    }

    pub(crate) fn do_fn<F>(f: F) -> Self
        where F: FnMut(&CanonicalCall) -> Result<Value> + Send + 'static
    {
        Responder::Do(Box::new(f))
    }

    /// Like `do_fn`, but for closures that aren't `Send`.  It is a runtime
    /// error to call the closure from a different thread than the one that
    /// created it.
    pub(crate) fn do_fn_st<F>(f: F) -> Self
        where F: FnMut(&CanonicalCall) -> Result<Value> + 'static
    {
        let mut fragile = Fragile::new(f);
        Responder::Do(Box::new(move |call: &CanonicalCall| {
            (fragile.get_mut())(call)
        }))
    }

    pub(crate) fn respond(&mut self, call: &CanonicalCall) -> Result<Value> {
        match self {
            Responder::Basic(v) => Ok(v.clone()),
            Responder::Raise(e) => Err(Error::Raised(e.clone())),
            Responder::Many{values, index, looping} => {
                if *index >= values.len() {
                    if *looping && !values.is_empty() {
                        *index = 0;
                    } else {
                        return Err(Error::NoBehaviourSpecified(
                            "No more responses. Do you want to loop through \
                            many responses?".to_string()));
                    }
                }
                let v = values[*index].clone();
                *index += 1;
                Ok(v)
            },
            Responder::Do(f) => f(call),
            Responder::Running => Err(Error::Mocking(
                "behaviour invoked again from within itself".to_string())),
        }
    }
}
