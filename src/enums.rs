//! Enumerations stored as `TEXT` columns.
//!
//! Each enum is written to the database, and to JSON, using its upper-case
//! wire name (e.g. `IN_PROGRESS`), which is also the form accepted by the API.

use std::{fmt, str::FromStr};

use diesel::{
    backend::Backend,
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    serialize::{self, IsNull, Output, ToSql},
    sql_types::Text,
    sqlite::Sqlite,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow,
        )]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {}: {other}",
                        stringify!($name)
                    )),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<'b>(
                &'b self,
                out: &mut Output<'b, '_, Sqlite>,
            ) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(
                bytes: <Sqlite as Backend>::RawValue<'_>,
            ) -> deserialize::Result<Self> {
                let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                raw.parse().map_err(Into::into)
            }
        }
    };
}

text_enum! {
    /// Account role. Only admins may create tournaments and manage matches.
    pub enum Role {
        User => "USER",
        Admin => "ADMIN",
    }
}

text_enum! {
    /// Lifecycle of a tournament (and of a match). Registration is only
    /// permitted while a tournament is [`Status::Open`].
    pub enum Status {
        Open => "OPEN",
        Scheduled => "SCHEDULED",
        InProgress => "IN_PROGRESS",
        Finished => "FINISHED",
        Cancelled => "CANCELLED",
    }
}

text_enum! {
    pub enum Gender {
        Male => "MALE",
        Female => "FEMALE",
        Other => "OTHER",
    }
}

text_enum! {
    pub enum SkillLevel {
        Beginner => "BEGINNER",
        Intermediate => "INTERMEDIATE",
        Advanced => "ADVANCED",
        Pro => "PRO",
    }
}

text_enum! {
    pub enum Forehand {
        Right => "RIGHT",
        Left => "LEFT",
    }
}

text_enum! {
    pub enum Backhand {
        OneHand => "ONE_HAND",
        TwoHands => "TWO_HANDS",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names_roundtrip() {
        for status in Status::ALL {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), *status);
        }
        assert_eq!("IN_PROGRESS".parse::<Status>(), Ok(Status::InProgress));
    }

    #[test]
    fn lowercase_status_is_rejected() {
        assert!("open".parse::<Status>().is_err());
        assert!("".parse::<Status>().is_err());
    }

    #[test]
    fn role_serializes_as_wire_name() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"ADMIN\"");
        let back: Role = serde_json::from_str("\"USER\"").unwrap();
        assert_eq!(back, Role::User);
        assert!(serde_json::from_str::<Role>("\"ROOT\"").is_err());
    }
}
