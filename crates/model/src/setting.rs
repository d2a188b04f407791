//! Plugin settings
//!
//! A [`PluginSetting`] is the parsed configuration block for one component:
//! the plugin type name plus its free-form attributes. The reserved type
//! name `pipeline` with a `name` attribute is how one pipeline declares
//! another as its source or sink; the topology builder recognizes and
//! synthesizes connectors for it.

use std::collections::HashMap;

/// Free-form attribute map for one plugin instance
///
/// Attributes carry whatever the plugin's factory needs; they come straight
/// out of the configuration document.
pub type Attributes = HashMap<String, toml::Value>;

/// Configuration for a single plugin instance (source, buffer, processor or
/// sink)
#[derive(Debug, Clone, PartialEq)]
pub struct PluginSetting {
    /// Plugin type name (`"random"`, `"blocking"`, `"stdout"`, ... or the
    /// reserved `"pipeline"`)
    name: String,

    /// Plugin-specific attributes
    attributes: Attributes,
}

impl PluginSetting {
    /// Create a setting with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
        }
    }

    /// Create a setting with the given attributes
    pub fn with_attributes(name: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            name: name.into(),
            attributes,
        }
    }

    /// Add one attribute (builder style, used heavily in tests)
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// The plugin type name
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All attributes
    #[inline]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Look up a raw attribute value
    #[inline]
    pub fn attribute(&self, key: &str) -> Option<&toml::Value> {
        self.attributes.get(key)
    }

    /// Look up a string attribute
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Look up an integer attribute
    pub fn attribute_i64(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(|v| v.as_integer())
    }

    /// Look up a boolean attribute
    pub fn attribute_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(|v| v.as_bool())
    }
}

/// A sink plugin setting tagged with the route names gating delivery
///
/// An empty route list means the sink receives every record the router
/// sees; a non-empty list restricts delivery to records matching at least
/// one named route.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedPluginSetting {
    setting: PluginSetting,
    routes: Vec<String>,
}

impl RoutedPluginSetting {
    /// Create a routed setting
    pub fn new(setting: PluginSetting, routes: Vec<String>) -> Self {
        Self { setting, routes }
    }

    /// Create a routed setting with no route restriction
    pub fn unrouted(setting: PluginSetting) -> Self {
        Self {
            setting,
            routes: Vec::new(),
        }
    }

    /// The wrapped plugin setting
    #[inline]
    pub fn setting(&self) -> &PluginSetting {
        &self.setting
    }

    /// The route names gating this sink
    #[inline]
    pub fn routes(&self) -> &[String] {
        &self.routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let setting = PluginSetting::new("blocking")
            .with_attribute("capacity", 512)
            .with_attribute("path", "/tmp/x")
            .with_attribute("enabled", true);

        assert_eq!(setting.name(), "blocking");
        assert_eq!(setting.attribute_i64("capacity"), Some(512));
        assert_eq!(setting.attribute_str("path"), Some("/tmp/x"));
        assert_eq!(setting.attribute_bool("enabled"), Some(true));
        assert_eq!(setting.attribute_str("missing"), None);
        // Wrong-typed lookups return None rather than panicking
        assert_eq!(setting.attribute_str("capacity"), None);
    }

    #[test]
    fn test_unrouted_sink() {
        let routed = RoutedPluginSetting::unrouted(PluginSetting::new("stdout"));
        assert!(routed.routes().is_empty());
        assert_eq!(routed.setting().name(), "stdout");
    }
}
