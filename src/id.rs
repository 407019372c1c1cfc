//! Code for handling IDs

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Clone,
            std::hash::Hash,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            serde::Deserialize,
            Debug,
            serde::Serialize,
        )]
        /// An ID type (e.g. `RegionID`, `ScenarioID`, etc.)
        pub struct $name(pub std::rc::Rc<str>);

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(std::rc::Rc::from(s))
            }
        }

        impl $name {
            /// Create a new ID from a string slice
            pub fn new(id: &str) -> Self {
                $name(std::rc::Rc::from(id))
            }

            /// The ID as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
    };
}
pub(crate) use define_id_type;

#[cfg(test)]
mod tests {
    define_id_type!(GenericID);

    #[test]
    fn test_id_display() {
        assert_eq!(GenericID::new("GB east").to_string(), "GB east");
        assert_eq!(GenericID::new("GB east").as_str(), "GB east");
        assert_eq!(GenericID::from("GB east".to_string()), "GB east".into());
    }

    #[test]
    fn test_id_ordering() {
        assert!(GenericID::new("GB east") < GenericID::new("GB east midland"));
    }
}
