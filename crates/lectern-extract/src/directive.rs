//! Directive handlers and fragment loaders.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Fragment, HandlerError};

/// Handler for a directive.
///
/// A handler receives each fragment naming its directive together with the
/// two output collections of the extraction, and may mutate them freely.
/// Closures with the matching signature are handlers.
///
/// # Example
///
/// ```
/// use lectern_extract::{Directive, Fragment, HandlerError};
///
/// struct Skip;
///
/// impl Directive<Vec<String>, Vec<String>> for Skip {
///     fn apply(
///         &self,
///         _fragment: Fragment,
///         _assets: &mut Vec<String>,
///         _data: &mut Vec<String>,
///     ) -> Result<(), HandlerError> {
///         Ok(())
///     }
/// }
/// ```
pub trait Directive<A, D> {
    /// Apply the fragment to the outputs.
    fn apply(&self, fragment: Fragment, assets: &mut A, data: &mut D) -> Result<(), HandlerError>;
}

impl<A, D, F> Directive<A, D> for F
where
    F: Fn(Fragment, &mut A, &mut D) -> Result<(), HandlerError>,
{
    fn apply(&self, fragment: Fragment, assets: &mut A, data: &mut D) -> Result<(), HandlerError> {
        self(fragment, assets, data)
    }
}

/// Mapping from directive name to handler.
///
/// The extractors only look at the *names*; handlers are used at dispatch.
///
/// # Example
///
/// ```
/// use lectern_extract::{Directives, Fragment, HandlerError};
///
/// let directives = Directives::<Vec<String>, ()>::new().with(
///     "note",
///     |fragment: Fragment, notes: &mut Vec<String>, _: &mut ()| -> Result<(), HandlerError> {
///         notes.push(fragment.as_text().to_owned());
///         Ok(())
///     },
/// );
///
/// assert!(directives.contains("note"));
/// assert_eq!(directives.names().collect::<Vec<_>>(), ["note"]);
/// ```
pub struct Directives<A, D> {
    handlers: BTreeMap<String, Box<dyn Directive<A, D>>>,
}

impl<A, D> Default for Directives<A, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, D> fmt::Debug for Directives<A, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl<A, D> Directives<A, D> {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register a handler, replacing any handler with the same name.
    #[must_use]
    pub fn with<H>(mut self, name: impl Into<String>, handler: H) -> Self
    where
        H: Directive<A, D> + 'static,
    {
        self.insert(name, handler);
        self
    }

    /// Register a handler, replacing any handler with the same name.
    pub fn insert<H: Directive<A, D> + 'static>(&mut self, name: impl Into<String>, handler: H) {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    /// Remove the handler registered under `name`.
    pub fn remove(&mut self, name: &str) -> bool {
        self.handlers.remove(name).is_some()
    }

    /// Look up the handler for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Directive<A, D>> {
        self.handlers.get(name).map(AsRef::as_ref)
    }

    /// Whether a handler is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered directive names, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of registered directives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no directive is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Pre-dispatch transformation of fragments.
///
/// Loaders run in order on every fragment before it reaches its handler.
/// Returning `None` drops the fragment. Loaders see the handler mapping, so
/// they can drop fragments for directives the caller does not handle.
///
/// # Example
///
/// ```
/// use lectern_extract::{Directives, Fragment, FragmentLoader};
///
/// let handled = |fragment: Fragment, directives: &Directives<(), ()>| {
///     directives.contains(&fragment.directive).then_some(fragment)
/// };
///
/// let directives = Directives::<(), ()>::new();
/// assert!(handled.load(Fragment::new("note", None, ""), &directives).is_none());
/// ```
pub trait FragmentLoader<A, D> {
    /// Transform or drop a fragment.
    fn load(&self, fragment: Fragment, directives: &Directives<A, D>) -> Option<Fragment>;
}

impl<A, D, F> FragmentLoader<A, D> for F
where
    F: Fn(Fragment, &Directives<A, D>) -> Option<Fragment>,
{
    fn load(&self, fragment: Fragment, directives: &Directives<A, D>) -> Option<Fragment> {
        self(fragment, directives)
    }
}

/// Dispatch a single fragment to its handler.
///
/// Fails with [`ExtractError::UnknownDirective`](crate::ExtractError::UnknownDirective)
/// without touching the outputs when no handler is registered for the
/// fragment. Handler errors are returned as
/// [`ExtractError::Handler`](crate::ExtractError::Handler).
pub fn dispatch<A, D>(
    directives: &Directives<A, D>,
    fragment: Fragment,
    assets: &mut A,
    data: &mut D,
) -> Result<(), crate::ExtractError> {
    let Some(handler) = directives.get(&fragment.directive) else {
        return Err(crate::ExtractError::UnknownDirective {
            name: fragment.directive,
        });
    };

    tracing::debug!(
        directive = %fragment.directive,
        line = fragment.start_line + 1,
        "Applying directive"
    );
    handler
        .apply(fragment, assets, data)
        .map_err(crate::ExtractError::Handler)
}

/// Apply loaders and dispatch every fragment, in order, into fresh outputs.
///
/// Stops at the first error.
pub fn apply_directives<A, D, I>(
    directives: &Directives<A, D>,
    fragments: I,
    loaders: &[&dyn FragmentLoader<A, D>],
) -> Result<(A, D), crate::ExtractError>
where
    A: Default,
    D: Default,
    I: IntoIterator<Item = Fragment>,
{
    let mut assets = A::default();
    let mut data = D::default();

    'fragments: for fragment in fragments {
        let mut fragment = fragment;
        for loader in loaders {
            let directive = fragment.directive.clone();
            match loader.load(fragment, directives) {
                Some(loaded) => fragment = loaded,
                None => {
                    tracing::debug!(directive = %directive, "Fragment dropped by loader");
                    continue 'fragments;
                }
            }
        }
        dispatch(directives, fragment, &mut assets, &mut data)?;
    }

    Ok((assets, data))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fmt;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ExtractError;

    type Log = Vec<String>;

    fn record(fragment: Fragment, assets: &mut Log, _data: &mut Log) -> Result<(), HandlerError> {
        assets.push(format!("{} {}", fragment.directive, fragment.arguments.join(",")));
        Ok(())
    }

    fn fragment(name: &str, arguments: &str) -> Fragment {
        Fragment::new(name, None, arguments)
    }

    #[derive(Debug)]
    struct Refused;

    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }

    impl std::error::Error for Refused {}

    #[test]
    fn test_dispatch_in_emission_order() {
        let directives = Directives::new().with("a", record).with("b", record);
        let fragments = vec![fragment("b", "1"), fragment("a", "2 3"), fragment("b", "")];

        let (assets, data) = apply_directives(&directives, fragments, &[]).unwrap();

        assert_eq!(assets, ["b 1", "a 2,3", "b "]);
        assert!(data.is_empty());
    }

    #[test]
    fn test_unknown_directive_leaves_outputs_untouched() {
        let directives = Directives::new().with("a", record);
        let mut assets = Log::new();
        let mut data = Log::new();

        let err = dispatch(&directives, fragment("zzz", "x"), &mut assets, &mut data).unwrap_err();

        assert!(matches!(err, ExtractError::UnknownDirective { ref name } if name == "zzz"));
        assert_eq!(err.to_string(), "unknown directive @zzz");
        assert!(assets.is_empty());
        assert!(data.is_empty());
    }

    #[test]
    fn test_unknown_directive_stops_application() {
        let directives = Directives::new().with("a", record);
        let fragments = vec![fragment("a", "1"), fragment("nope", ""), fragment("a", "2")];

        let result = apply_directives(&directives, fragments, &[]);
        assert!(matches!(result, Err(ExtractError::UnknownDirective { .. })));
    }

    #[test]
    fn test_handler_error_is_passed_through() {
        let directives = Directives::<Log, Log>::new().with(
            "fail",
            |_: Fragment, _: &mut Log, _: &mut Log| -> Result<(), HandlerError> {
                Err(Box::new(Refused))
            },
        );

        let err = apply_directives(&directives, vec![fragment("fail", "")], &[]).unwrap_err();

        assert_eq!(err.to_string(), "refused");
        match err {
            ExtractError::Handler(source) => assert!(source.downcast_ref::<Refused>().is_some()),
            other => panic!("expected handler error, got {other:?}"),
        }
    }

    #[test]
    fn test_loaders_transform_and_drop() {
        let directives = Directives::new().with("a", record).with("b", record);
        let upper = |mut f: Fragment, _: &Directives<Log, Log>| {
            f.arguments = f.arguments.iter().map(|a| a.to_uppercase()).collect();
            Some(f)
        };
        let drop_b = |f: Fragment, _: &Directives<Log, Log>| (f.directive != "b").then_some(f);
        let loaders: [&dyn FragmentLoader<Log, Log>; 2] = [&upper, &drop_b];

        let fragments = vec![fragment("a", "x"), fragment("b", "y"), fragment("a", "z")];
        let (assets, _) = apply_directives(&directives, fragments, &loaders).unwrap();

        assert_eq!(assets, ["a X", "a Z"]);
    }

    #[test]
    fn test_loader_can_skip_unhandled_directives() {
        let directives = Directives::new().with("a", record);
        let handled =
            |f: Fragment, d: &Directives<Log, Log>| d.contains(&f.directive).then_some(f);
        let loaders: [&dyn FragmentLoader<Log, Log>; 1] = [&handled];

        let fragments = vec![fragment("a", "x"), fragment("zzz", "y"), fragment("a", "z")];
        let (assets, _) = apply_directives(&directives, fragments, &loaders).unwrap();

        assert_eq!(assets, ["a x", "a z"]);
    }

    #[test]
    fn test_dropped_fragment_is_not_checked_against_mapping() {
        let directives = Directives::new().with("a", record);
        let drop_all = |_: Fragment, _: &Directives<Log, Log>| -> Option<Fragment> { None };
        let loaders: [&dyn FragmentLoader<Log, Log>; 1] = [&drop_all];

        let (assets, _) = apply_directives(&directives, vec![fragment("nope", "")], &loaders)
            .unwrap();
        assert!(assets.is_empty());
    }

    #[test]
    fn test_replacing_handler_keeps_name() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut directives = Directives::<Log, Log>::new().with("a", record);
        directives.insert(
            "a",
            move |_: Fragment, _: &mut Log, _: &mut Log| -> Result<(), HandlerError> {
                counter.set(counter.get() + 1);
                Ok(())
            },
        );
        assert_eq!(directives.len(), 1);

        let (assets, _) = apply_directives(&directives, vec![fragment("a", "x")], &[]).unwrap();
        assert!(assets.is_empty());
        assert_eq!(calls.get(), 1);

        assert!(directives.remove("a"));
        assert!(directives.is_empty());
    }
}
