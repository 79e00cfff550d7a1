//! Locale context: the active locale plus the optional fallback mechanism.
//!
//! The context is an explicit value passed to every resolution and lookup
//! call. Temporary switches go through [`LocaleContext::switch`], whose guard
//! restores the previous locale when dropped, so an early return or a panic
//! inside the switched section cannot leak the temporary locale.

use crate::i18n::{Fallbacks, Locale};
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

/// Active locale and fallback configuration for one logical operation.
#[derive(Debug, Clone)]
pub struct LocaleContext {
    active: Locale,
    fallbacks: Option<Arc<Fallbacks>>,
}

impl LocaleContext {
    /// Create a context with fallbacks enabled but no mappings.
    pub fn new(active: Locale) -> Self {
        Self::with_fallbacks(active, Fallbacks::new())
    }

    /// Create a context with the given fallback configuration.
    pub fn with_fallbacks(active: Locale, fallbacks: Fallbacks) -> Self {
        Self {
            active,
            fallbacks: Some(Arc::new(fallbacks)),
        }
    }

    /// Create a context without any fallback mechanism.
    ///
    /// Resolution under such a context never consults the persisted store.
    pub fn without_fallbacks(active: Locale) -> Self {
        Self {
            active,
            fallbacks: None,
        }
    }

    /// Get the active locale.
    pub fn active(&self) -> &Locale {
        &self.active
    }

    /// Replace the active locale.
    pub fn set_active(&mut self, locale: Locale) {
        self.active = locale;
    }

    /// Get the fallback configuration, if the mechanism is available.
    pub fn fallbacks(&self) -> Option<&Fallbacks> {
        self.fallbacks.as_deref()
    }

    /// Fallback chain for the active locale, or `None` when fallbacks are
    /// unsupported.
    pub fn fallback_chain(&self) -> Option<Vec<Locale>> {
        self.fallbacks().map(|f| f.chain(&self.active))
    }

    /// Temporarily switch the active locale.
    ///
    /// The returned guard dereferences to this context; the previous locale
    /// is restored when the guard is dropped.
    pub fn switch(&mut self, locale: Locale) -> LocaleGuard<'_> {
        let previous = std::mem::replace(&mut self.active, locale);
        LocaleGuard {
            context: self,
            previous: Some(previous),
        }
    }

    /// Run `f` with `locale` active, restoring the previous locale afterwards.
    pub fn with_locale<T>(&mut self, locale: Locale, f: impl FnOnce(&mut LocaleContext) -> T) -> T {
        let mut guard = self.switch(locale);
        f(&mut *guard)
    }
}

/// Scope guard returned by [`LocaleContext::switch`].
#[derive(Debug)]
pub struct LocaleGuard<'a> {
    context: &'a mut LocaleContext,
    previous: Option<Locale>,
}

impl LocaleGuard<'_> {
    /// The locale that will be restored on drop.
    pub fn previous(&self) -> Option<&Locale> {
        self.previous.as_ref()
    }
}

impl Deref for LocaleGuard<'_> {
    type Target = LocaleContext;

    fn deref(&self) -> &LocaleContext {
        self.context
    }
}

impl DerefMut for LocaleGuard<'_> {
    fn deref_mut(&mut self) -> &mut LocaleContext {
        self.context
    }
}

impl Drop for LocaleGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            self.context.active = previous;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn loc(code: &str) -> Locale {
        Locale::new(code).unwrap()
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_has_fallbacks() {
        let ctx = LocaleContext::new(loc("en"));
        assert_eq!(ctx.active(), &loc("en"));
        assert_eq!(ctx.fallback_chain(), Some(vec![loc("en")]));
    }

    #[test]
    fn test_without_fallbacks_has_no_chain() {
        let ctx = LocaleContext::without_fallbacks(loc("en"));
        assert!(ctx.fallbacks().is_none());
        assert!(ctx.fallback_chain().is_none());
    }

    #[test]
    fn test_chain_follows_active_locale() {
        let mut fallbacks = Fallbacks::with_default(loc("en"));
        fallbacks.map(loc("es"), [loc("ca")]);
        let mut ctx = LocaleContext::with_fallbacks(loc("es"), fallbacks);

        assert_eq!(
            ctx.fallback_chain(),
            Some(vec![loc("es"), loc("ca"), loc("en")])
        );

        ctx.set_active(loc("de"));
        assert_eq!(ctx.fallback_chain(), Some(vec![loc("de"), loc("en")]));
    }

    // ==================== Scoped Switch Tests ====================

    #[test]
    fn test_switch_restores_on_drop() {
        let mut ctx = LocaleContext::new(loc("klingon"));
        {
            let guard = ctx.switch(loc("es"));
            assert_eq!(guard.active(), &loc("es"));
            assert_eq!(guard.previous(), Some(&loc("klingon")));
        }
        assert_eq!(ctx.active(), &loc("klingon"));
    }

    #[test]
    fn test_with_locale_returns_value_and_restores() {
        let mut ctx = LocaleContext::new(loc("en"));
        let seen = ctx.with_locale(loc("ca"), |inner| inner.active().clone());
        assert_eq!(seen, loc("ca"));
        assert_eq!(ctx.active(), &loc("en"));
    }

    #[test]
    fn test_nested_switches_unwind_in_order() {
        let mut ctx = LocaleContext::new(loc("en"));
        ctx.with_locale(loc("es"), |outer| {
            outer.with_locale(loc("ca"), |inner| {
                assert_eq!(inner.active(), &loc("ca"));
            });
            assert_eq!(outer.active(), &loc("es"));
        });
        assert_eq!(ctx.active(), &loc("en"));
    }

    #[test]
    fn test_set_active_inside_switch_is_discarded() {
        let mut ctx = LocaleContext::new(loc("en"));
        ctx.with_locale(loc("es"), |inner| inner.set_active(loc("pt")));
        assert_eq!(ctx.active(), &loc("en"));
    }

    #[test]
    fn test_switch_restores_on_panic() {
        let mut ctx = LocaleContext::new(loc("en"));
        let result = catch_unwind(AssertUnwindSafe(|| {
            ctx.with_locale(loc("de"), |_| panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(ctx.active(), &loc("en"));
    }

    #[test]
    fn test_switch_restores_on_error_return() {
        fn failing(ctx: &mut LocaleContext) -> Result<(), String> {
            let _guard = ctx.switch(Locale::new("de").unwrap());
            let _count: u32 = "not a number".parse().map_err(|_| "failed".to_string())?;
            Ok(())
        }

        let mut ctx = LocaleContext::new(loc("en"));
        assert!(failing(&mut ctx).is_err());
        assert_eq!(ctx.active(), &loc("en"));
    }
}
