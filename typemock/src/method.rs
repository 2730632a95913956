// vim: tw=80
//! Per-member state: bindings, call history, and canonicalization.
use std::{cell::RefCell, collections::BTreeMap, mem, sync::Arc};

use tracing::{debug, trace};

use crate::{
    args::{Arg, Args, CanonicalCall, Pattern},
    description::{AttributeSpec, MethodSpec, ParamKind},
    error::{Error, Result},
    responder::Responder,
    value::Value
};

struct Binding {
    pattern: Pattern,
    responder: Responder,
}

/// Bind supplied arguments to a method's declared parameters, the way an
/// ordinary call would, filling in defaults for anything omitted.
pub(crate) fn canonicalize(method: &MethodSpec, args: Args) -> Result<Pattern>
{
    let name = method.name();
    let err = |msg: String| Error::ArgumentBinding(format!("{}(): {}", name,
                                                           msg));
    let (positional, keyword) = args.into_parts();
    for (i, (kn, _)) in keyword.iter().enumerate() {
        if keyword[..i].iter().any(|(n, _)| n == kn) {
            return Err(err(format!("keyword argument `{}` repeated", kn)));
        }
    }
    let mut keyword: Vec<Option<(String, Arg)>> =
        keyword.into_iter().map(Some).collect();
    let mut take_keyword = |pname: &str| -> Option<Arg> {
        keyword.iter_mut()
            .find(|k| k.as_ref().is_some_and(|(n, _)| n == pname))
            .and_then(Option::take)
            .map(|(_, a)| a)
    };

    let n_positional = positional.len();
    let mut positional = positional.into_iter();
    let mut consumed = 0;
    let mut has_var_positional = false;
    let mut var_keyword = None;
    let mut entries = Vec::with_capacity(method.params().len());
    for param in method.params() {
        let pname = param.name();
        let arg = match param.kind() {
            ParamKind::PositionalOrKeyword => {
                let by_position = positional.next();
                if by_position.is_some() {
                    consumed += 1;
                }
                match (by_position, take_keyword(pname)) {
                    (Some(_), Some(_)) => return Err(err(format!(
                        "got multiple values for argument `{}`", pname))),
                    (Some(a), None) | (None, Some(a)) => a,
                    (None, None) => match param.default_value() {
                        Some(d) => Arg::Value(d.clone()),
                        None => return Err(err(format!(
                            "missing required argument `{}`", pname)))
                    }
                }
            },
            ParamKind::KeywordOnly => {
                match (take_keyword(pname), param.default_value()) {
                    (Some(a), _) => a,
                    (None, Some(d)) => Arg::Value(d.clone()),
                    (None, None) => return Err(err(format!(
                        "missing required keyword argument `{}`", pname)))
                }
            },
            ParamKind::VarPositional => {
                has_var_positional = true;
                let rest: Vec<Arg> = positional.by_ref().collect();
                consumed += rest.len();
                Arg::Tuple(rest)
            },
            ParamKind::VarKeyword => {
                // Filled in once every named parameter has had its pick
                var_keyword = Some(entries.len());
                Arg::Map(BTreeMap::new())
            }
        };
        entries.push((pname.to_string(), arg));
    }

    if consumed < n_positional && !has_var_positional {
        let accepted = method.params().iter()
            .filter(|p| p.kind() == ParamKind::PositionalOrKeyword)
            .count();
        return Err(err(format!("takes {} positional arguments but {} were \
                               given", accepted, n_positional)));
    }
    let leftover: Vec<(String, Arg)> = keyword.into_iter().flatten().collect();
    match var_keyword {
        Some(i) => {
            entries[i].1 = Arg::Map(leftover.into_iter().collect());
        },
        None => {
            if let Some((n, _)) = leftover.first() {
                return Err(err(format!("got an unexpected keyword argument \
                                       `{}`", n)));
            }
        }
    }
    Ok(Pattern::new(entries))
}

/// Bindings and history of one mocked method.
pub(crate) struct MockMethodState {
    spec: Arc<MethodSpec>,
    bindings: Vec<Binding>,
    history: Vec<CanonicalCall>,
}

impl MockMethodState {
    pub(crate) fn new(spec: Arc<MethodSpec>) -> Self {
        MockMethodState{spec, bindings: Vec::new(), history: Vec::new()}
    }

    pub(crate) fn spec(&self) -> &MethodSpec {
        &self.spec
    }

    pub(crate) fn canonicalize(&self, args: Args) -> Result<Pattern> {
        canonicalize(&self.spec, args)
    }

    /// Append a binding, returning its index.
    pub(crate) fn register_binding(&mut self, pattern: Pattern,
                                   responder: Responder) -> usize
    {
        trace!(method = self.spec.name(), %pattern, "registered behaviour");
        self.bindings.push(Binding{pattern, responder});
        self.bindings.len() - 1
    }

    /// Replace the responder of an existing binding.
    pub(crate) fn set_responder(&mut self, index: usize, responder: Responder)
    {
        self.bindings[index].responder = responder;
    }

    /// Lend out the responder of the most recently registered binding that
    /// matches `call`, along with its index.
    fn checkout(&mut self, call: &CanonicalCall) -> Result<(usize, Responder)>
    {
        let name = self.spec.name();
        let found = self.bindings.iter_mut()
            .enumerate()
            .rev()
            .find(|(_, b)| b.pattern.matches(call));
        match found {
            Some((_, b)) if matches!(b.responder, Responder::Running) => {
                Err(Error::Mocking(format!(
                    "{}{}: behaviour invoked again from within itself", name,
                    call)))
            },
            Some((i, b)) => {
                trace!(method = name, %call, "dispatching");
                Ok((i, mem::replace(&mut b.responder, Responder::Running)))
            },
            None => {
                debug!(method = name, %call, "no matching behaviour");
                Err(Error::NoBehaviourSpecified(format!(
                    "No behaviour specified for {}{}", name, call)))
            }
        }
    }

    /// Run the most recently registered binding that matches `call`.
    ///
    /// No borrow of `state` is held while the responder runs, so a callback
    /// may inspect the mock.  The call is recorded unless it misses, or
    /// `check` rejects the value it produced.
    pub(crate) fn dispatch<F>(state: &RefCell<Self>, call: CanonicalCall,
                              check: F) -> Result<Value>
        where F: FnOnce(&Value) -> Result<()>
    {
        let (index, mut responder) = state.borrow_mut().checkout(&call)?;
        let result = responder.respond(&call);
        let mut this = state.borrow_mut();
        this.bindings[index].responder = responder;
        if let Ok(v) = &result {
            check(v)?;
        }
        this.history.push(call);
        result
    }

    pub(crate) fn history(&self) -> &[CanonicalCall] {
        &self.history
    }
}

/// Behaviour and history of one mocked attribute.
///
/// Reads behave like calls of a method without parameters.  Writes are
/// recorded, and answer subsequent reads.
pub(crate) struct MockAttributeState {
    spec: Arc<AttributeSpec>,
    responders: Vec<Responder>,
    reads: usize,
    writes: Vec<Value>,
}

impl MockAttributeState {
    pub(crate) fn new(spec: Arc<AttributeSpec>) -> Self {
        MockAttributeState {
            spec,
            responders: Vec::new(),
            reads: 0,
            writes: Vec::new()
        }
    }

    pub(crate) fn spec(&self) -> &AttributeSpec {
        &self.spec
    }

    pub(crate) fn register_responder(&mut self, responder: Responder) -> usize
    {
        trace!(attribute = self.spec.name(), "registered behaviour");
        self.responders.push(responder);
        self.responders.len() - 1
    }

    pub(crate) fn set_responder(&mut self, index: usize, responder: Responder)
    {
        self.responders[index] = responder;
    }

    /// Answer a read with the most recent behaviour.  As with
    /// [`MockMethodState::dispatch`], the responder runs unborrowed, and a
    /// read whose value `check` rejects isn't counted.
    pub(crate) fn read<F>(state: &RefCell<Self>, check: F) -> Result<Value>
        where F: FnOnce(&Value) -> Result<()>
    {
        let (index, mut responder) = {
            let mut this = state.borrow_mut();
            let name = this.spec.name().to_string();
            match this.responders.iter_mut().enumerate().next_back() {
                Some((_, Responder::Running)) => return Err(Error::Mocking(
                    format!("attribute {} read again from within its own \
                            behaviour", name))),
                Some((i, r)) => (i, mem::replace(r, Responder::Running)),
                None => return Err(Error::NoBehaviourSpecified(format!(
                    "No behaviour specified for attribute {}", name)))
            }
        };
        let result = responder.respond(&CanonicalCall::default());
        let mut this = state.borrow_mut();
        this.responders[index] = responder;
        if let Ok(v) = &result {
            check(v)?;
        }
        this.reads += 1;
        result
    }

    pub(crate) fn write(&mut self, value: Value) {
        self.writes.push(value.clone());
        self.responders.push(Responder::Basic(value));
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads
    }

    pub(crate) fn writes(&self) -> &[Value] {
        &self.writes
    }
}
