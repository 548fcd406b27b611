use std::borrow::Cow;

/// Provider identifier - the registry's record id
pub type ProviderId = Cow<'static, str>;
