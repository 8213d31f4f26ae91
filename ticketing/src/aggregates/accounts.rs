//! User accounts: registration, authentication and activation.

use super::notification::notify;
use super::{BoxOfficeAction, Reply, respond};
use crate::config::AdminConfig;
use crate::environment::BoxOfficeEnvironment;
use crate::error::BoxOfficeError;
use crate::types::{CorrelationId, Database, User, UserId, UserRole};
use boxoffice_core::{SmallVec, effect::Effect, reducer::Reducer};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Self-service attendee sign-up
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    /// Login e-mail
    pub email: String,
    /// Chosen password
    pub password: String,
    /// Display name
    pub full_name: String,
    /// Contact number
    pub phone_number: Option<String>,
}

/// Organizer account created by an administrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizerProfile {
    /// Login e-mail
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Contact number
    pub phone_number: Option<String>,
    /// Company
    pub organization_name: Option<String>,
}

/// Account commands
#[derive(Clone, Debug)]
pub enum AccountsAction {
    /// Create an attendee account
    RegisterAttendee {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Sign-up details
        registration: Registration,
    },
    /// Create an organizer account with a generated password
    RegisterOrganizer {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Organizer details
        profile: OrganizerProfile,
    },
    /// Replace a password after checking the current one
    ChangePassword {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Account
        user_id: UserId,
        /// Must match the stored password
        current_password: String,
        /// Replacement
        new_password: String,
    },
    /// Activate or deactivate an account
    SetActive {
        /// Reply correlation
        correlation_id: CorrelationId,
        /// Account
        user_id: UserId,
        /// New flag
        active: bool,
    },
}

/// Insert the administrator account unless its e-mail is already taken
pub fn seed_admin(state: &mut Database, admin: &AdminConfig, now: DateTime<Utc>) -> UserId {
    if let Some(existing) = state.user_by_email(&admin.email) {
        return existing.id;
    }
    let user = User {
        id: UserId::new(),
        email: admin.email.trim().to_string(),
        password: admin.password.clone(),
        role: UserRole::Admin,
        full_name: "System Administrator".to_string(),
        phone_number: None,
        organization_name: None,
        must_change_password: false,
        is_active: true,
        created_at: now,
    };
    let id = user.id;
    state.users.insert(id, user);
    tracing::info!(user_id = %id, email = %admin.email, "Seeded administrator account");
    id
}

/// Check credentials
///
/// # Errors
///
/// [`BoxOfficeError::InvalidCredentials`] if no account matches and
/// [`BoxOfficeError::AccountInactive`] if the account is deactivated.
pub fn authenticate(state: &Database, email: &str, password: &str) -> Result<User, BoxOfficeError> {
    let user = state
        .user_by_email(email)
        .filter(|user| user.password == password)
        .ok_or(BoxOfficeError::InvalidCredentials)?;
    if !user.is_active {
        return Err(BoxOfficeError::AccountInactive);
    }
    Ok(user.clone())
}

fn check_profile(email: &str, full_name: &str) -> Result<(), BoxOfficeError> {
    let email = email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(BoxOfficeError::InvalidAccount("A valid email address is required".to_string()));
    }
    if full_name.trim().is_empty() {
        return Err(BoxOfficeError::InvalidAccount("Full name is required".to_string()));
    }
    Ok(())
}

/// `Event@NNNN` with four random digits
fn default_password() -> String {
    format!("Event@{}", rand::thread_rng().gen_range(1000..10_000))
}

fn welcome_message(user: &User, password: &str) -> String {
    format!(
        "Welcome to HELP Events Management System!\n\n\
         Your account has been created successfully.\n\n\
         Username: {}\n\
         Default Password: {password}\n\n\
         Please log in and change your password immediately for security purposes.\n\n\
         If you have any questions, please contact the administrator.\n\n\
         Best regards,\nHELP Events Team",
        user.email
    )
}

/// Reducer for user accounts
#[derive(Clone, Debug, Default)]
pub struct AccountsReducer;

impl AccountsReducer {
    /// Creates a new `AccountsReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for AccountsReducer {
    type State = Database;
    type Action = BoxOfficeAction;
    type Environment = BoxOfficeEnvironment;

    fn reduce(
        &self,
        state: &mut Database,
        action: BoxOfficeAction,
        env: &BoxOfficeEnvironment,
    ) -> SmallVec<[Effect<BoxOfficeAction>; 4]> {
        let BoxOfficeAction::Accounts(action) = action else {
            return SmallVec::new();
        };

        match action {
            AccountsAction::RegisterAttendee {
                correlation_id,
                registration,
            } => {
                let result = check_profile(&registration.email, &registration.full_name).and_then(|()| {
                    if registration.password.is_empty() {
                        return Err(BoxOfficeError::InvalidAccount("Password is required".to_string()));
                    }
                    if state.user_by_email(&registration.email).is_some() {
                        return Err(BoxOfficeError::EmailAlreadyRegistered);
                    }
                    let user = User {
                        id: UserId::new(),
                        email: registration.email.trim().to_string(),
                        password: registration.password,
                        role: UserRole::Attendee,
                        full_name: registration.full_name,
                        phone_number: registration.phone_number,
                        organization_name: None,
                        must_change_password: false,
                        is_active: true,
                        created_at: env.now(),
                    };
                    state.users.insert(user.id, user.clone());
                    tracing::info!(user_id = %user.id, "Attendee registered");
                    Ok(Reply::User(user))
                });
                respond(env, correlation_id, result)
            },

            AccountsAction::RegisterOrganizer {
                correlation_id,
                profile,
            } => {
                if let Err(error) = check_profile(&profile.email, &profile.full_name) {
                    return respond(env, correlation_id, Err(error));
                }
                if state.user_by_email(&profile.email).is_some() {
                    return respond(env, correlation_id, Err(BoxOfficeError::EmailTakenByAnotherUser));
                }

                let password = default_password();
                let user = User {
                    id: UserId::new(),
                    email: profile.email.trim().to_string(),
                    password: password.clone(),
                    role: UserRole::EventOrganizer,
                    full_name: profile.full_name,
                    phone_number: profile.phone_number,
                    organization_name: profile.organization_name,
                    must_change_password: true,
                    is_active: true,
                    created_at: env.now(),
                };
                state.users.insert(user.id, user.clone());
                tracing::info!(user_id = %user.id, "Organizer registered");

                let (_, welcome) = notify(
                    state,
                    env,
                    user.id,
                    "Welcome to HELP Events - Account Created",
                    welcome_message(&user, &password),
                );
                let mut effects = respond(env, correlation_id, Ok(Reply::User(user)));
                effects.push(welcome);
                effects
            },

            AccountsAction::ChangePassword {
                correlation_id,
                user_id,
                current_password,
                new_password,
            } => {
                let result = match state.users.get_mut(&user_id) {
                    None => Err(BoxOfficeError::UserNotFound),
                    Some(user) if user.password != current_password => Err(BoxOfficeError::IncorrectPassword),
                    Some(_) if new_password.is_empty() => {
                        Err(BoxOfficeError::InvalidAccount("Password is required".to_string()))
                    },
                    Some(user) => {
                        user.password = new_password;
                        user.must_change_password = false;
                        Ok(Reply::User(user.clone()))
                    },
                };
                respond(env, correlation_id, result)
            },

            AccountsAction::SetActive {
                correlation_id,
                user_id,
                active,
            } => {
                let result = state
                    .users
                    .get_mut(&user_id)
                    .map(|user| {
                        user.is_active = active;
                        tracing::info!(%user_id, active, "Account activation changed");
                        Reply::User(user.clone())
                    })
                    .ok_or(BoxOfficeError::UserNotFound);
                respond(env, correlation_id, result)
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::aggregates::fixtures::{env, reply_in, user};
    use boxoffice_testing::mocks::test_instant;
    use boxoffice_testing::{ReducerTest, assertions};

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "Pa55word!".to_string(),
            full_name: "Alex Doe".to_string(),
            phone_number: Some("+60 12 345 6789".to_string()),
        }
    }

    fn organizer_profile(email: &str) -> OrganizerProfile {
        OrganizerProfile {
            email: email.to_string(),
            full_name: "Jordan Lee".to_string(),
            phone_number: None,
            organization_name: Some("Lee Productions".to_string()),
        }
    }

    #[test]
    fn test_register_attendee() {
        let correlation_id = CorrelationId::new();

        ReducerTest::new(AccountsReducer::new())
            .with_env(env())
            .given_state(Database::new())
            .when_action(BoxOfficeAction::Accounts(AccountsAction::RegisterAttendee {
                correlation_id,
                registration: registration("alex@example.com"),
            }))
            .then_state(|db| {
                let user = db.user_by_email("alex@example.com").unwrap();
                assert_eq!(user.role, UserRole::Attendee);
                assert!(user.is_active);
                assert!(!user.must_change_password);
            })
            .then_effects(move |effects| {
                assertions::assert_effects_count(effects, 1);
                assert!(matches!(reply_in(effects, correlation_id), Ok(Reply::User(_))));
            })
            .run();
    }

    #[test]
    fn test_register_attendee_duplicate_email() {
        let mut db = Database::new();
        let existing = user(UserRole::Attendee, "alex@example.com");
        db.users.insert(existing.id, existing);
        let correlation_id = CorrelationId::new();

        ReducerTest::new(AccountsReducer::new())
            .with_env(env())
            .given_state(db)
            .when_action(BoxOfficeAction::Accounts(AccountsAction::RegisterAttendee {
                correlation_id,
                registration: registration("ALEX@example.com"),
            }))
            .then_state(|db| assert_eq!(db.users.len(), 1))
            .then_effects(move |effects| {
                assert_eq!(
                    reply_in(effects, correlation_id),
                    Err(BoxOfficeError::EmailAlreadyRegistered)
                );
            })
            .run();
    }

    #[test]
    fn test_register_organizer_generates_password_and_welcome() {
        let correlation_id = CorrelationId::new();

        ReducerTest::new(AccountsReducer::new())
            .with_env(env())
            .given_state(Database::new())
            .when_action(BoxOfficeAction::Accounts(AccountsAction::RegisterOrganizer {
                correlation_id,
                profile: organizer_profile("jordan@example.com"),
            }))
            .then_state(|db| {
                let organizer = db.user_by_email("jordan@example.com").unwrap();
                assert_eq!(organizer.role, UserRole::EventOrganizer);
                assert!(organizer.must_change_password);

                let digits = organizer.password.strip_prefix("Event@").unwrap();
                assert_eq!(digits.len(), 4);
                assert!(digits.parse::<u32>().is_ok_and(|n| (1000..10_000).contains(&n)));

                assert_eq!(db.notifications.len(), 1);
                assert!(db.notifications[0].message.contains(&organizer.password));
            })
            .then_effects(move |effects| {
                assertions::assert_has_future_effect(effects);
                assert!(matches!(reply_in(effects, correlation_id), Ok(Reply::User(_))));
            })
            .run();
    }

    #[test]
    fn test_register_organizer_with_taken_email() {
        let mut db = Database::new();
        let existing = user(UserRole::Attendee, "jordan@example.com");
        db.users.insert(existing.id, existing);
        let correlation_id = CorrelationId::new();

        ReducerTest::new(AccountsReducer::new())
            .with_env(env())
            .given_state(db)
            .when_action(BoxOfficeAction::Accounts(AccountsAction::RegisterOrganizer {
                correlation_id,
                profile: organizer_profile("jordan@example.com"),
            }))
            .then_state(|db| assert!(db.notifications.is_empty()))
            .then_effects(move |effects| {
                assert_eq!(
                    reply_in(effects, correlation_id),
                    Err(BoxOfficeError::EmailTakenByAnotherUser)
                );
            })
            .run();
    }

    #[test]
    fn test_change_password() {
        let mut db = Database::new();
        let mut organizer = user(UserRole::EventOrganizer, "jordan@example.com");
        organizer.must_change_password = true;
        let user_id = organizer.id;
        db.users.insert(user_id, organizer);
        let (wrong, right) = (CorrelationId::new(), CorrelationId::new());

        ReducerTest::new(AccountsReducer::new())
            .with_env(env())
            .given_state(db)
            .when_action(BoxOfficeAction::Accounts(AccountsAction::ChangePassword {
                correlation_id: wrong,
                user_id,
                current_password: "nope".to_string(),
                new_password: "N3w!".to_string(),
            }))
            .when_action(BoxOfficeAction::Accounts(AccountsAction::ChangePassword {
                correlation_id: right,
                user_id,
                current_password: "Secret@123".to_string(),
                new_password: "N3w!".to_string(),
            }))
            .then_state(move |db| {
                let user = &db.users[&user_id];
                assert_eq!(user.password, "N3w!");
                assert!(!user.must_change_password);
            })
            .then_effects(move |effects| {
                assert!(matches!(reply_in(effects, right), Ok(Reply::User(_))));
            })
            .run();
    }

    #[test]
    fn test_authenticate() {
        let mut db = Database::new();
        let admin = AdminConfig {
            email: "admin@helpevents.com".to_string(),
            password: "Admin@123".to_string(),
        };
        let admin_id = seed_admin(&mut db, &admin, test_instant());
        assert_eq!(seed_admin(&mut db, &admin, test_instant()), admin_id);

        assert_eq!(authenticate(&db, "admin@helpevents.com", "Admin@123").unwrap().id, admin_id);
        assert_eq!(
            authenticate(&db, "admin@helpevents.com", "wrong"),
            Err(BoxOfficeError::InvalidCredentials)
        );

        db.users.get_mut(&admin_id).unwrap().is_active = false;
        assert_eq!(
            authenticate(&db, "admin@helpevents.com", "Admin@123"),
            Err(BoxOfficeError::AccountInactive)
        );
    }

    #[test]
    fn test_set_active_unknown_user() {
        let correlation_id = CorrelationId::new();

        ReducerTest::new(AccountsReducer::new())
            .with_env(env())
            .given_state(Database::new())
            .when_action(BoxOfficeAction::Accounts(AccountsAction::SetActive {
                correlation_id,
                user_id: UserId::new(),
                active: false,
            }))
            .then_effects(move |effects| {
                assert_eq!(reply_in(effects, correlation_id), Err(BoxOfficeError::UserNotFound));
            })
            .run();
    }
}
