use super::fixtures::{self, DemoUser};
use super::{error, param_str};
use crate::core::format::group_thousands;
use crate::providers::identity::ANONYMOUS;
use crate::providers::methods;
use crate::providers::server::ProviderHandler;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

const CREATED_AT: &str = "2024-01-15T08:00:00+00:00";
const UPDATED_AT: &str = "2024-06-01T12:00:00+00:00";

pub struct DemoUserProvider {
    users: Vec<DemoUser>,
}

impl Default for DemoUserProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoUserProvider {
    pub fn new() -> Self {
        Self {
            users: fixtures::users(),
        }
    }

    /// Match by id, email or username.
    fn find(&self, identifier: &str) -> Option<&DemoUser> {
        self.users
            .iter()
            .find(|u| u.id == identifier || u.email == identifier || u.username == identifier)
    }

    fn profile(&self, user_id: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        match self.find(user_id) {
            Some(user) => json!({
                "user_id": user.id,
                "name": user.full_name(),
                "email": user.email,
                "username": user.username,
                "full_name": user.full_name(),
                "nickname": user.nickname,
                "role": user.role,
                "firstName": user.first_name,
                "lastName": user.last_name,
                "phone": user.phone,
                "language": user.language,
                "isActive": true,
                "verified": true,
                "storeId": user.store_id,
                "level": user.level,
                "created_at": CREATED_AT,
                "updated_at": UPDATED_AT,
                "preferences": {
                    "communication_style": "professional",
                    "language": user.language,
                    "response_length": "detailed"
                },
                "history": user.history,
                "custom_data": {}
            }),
            None if user_id == ANONYMOUS => json!({
                "user_id": ANONYMOUS,
                "name": "Khách hàng",
                "email": null,
                "username": ANONYMOUS,
                "full_name": "Khách hàng",
                "role": "guest",
                "language": "vi",
                "isActive": true,
                "verified": false,
                "preferences": {
                    "communication_style": "friendly",
                    "language": "vi",
                    "response_length": "concise"
                },
                "history": [],
                "custom_data": {}
            }),
            None => error(format!("User profile not found for user {}", user_id)),
        }
    }

    fn basic(user: &DemoUser) -> Value {
        json!({
            "user_id": user.id,
            "username": user.username,
            "email": user.email,
            "full_name": user.full_name(),
            "role": user.role,
        })
    }

    fn by_email(&self, email: Option<&str>) -> Value {
        let Some(email) = email else {
            return error("email is required");
        };
        self.users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(Self::basic)
            .unwrap_or_else(|| error(format!("User not found with email {}", email)))
    }

    fn by_username(&self, username: Option<&str>) -> Value {
        let Some(username) = username else {
            return error("username is required");
        };
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(Self::basic)
            .unwrap_or_else(|| error(format!("User not found with username {}", username)))
    }

    fn balance_entry(user: &DemoUser) -> Value {
        json!({
            "user_id": user.id,
            "balance": user.balance,
            "balance_formatted": group_thousands(user.balance),
            "points": user.points,
            "points_formatted": group_thousands(user.points),
            "last_updated": UPDATED_AT,
        })
    }

    fn balance(&self, user_id: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        match self.find(user_id) {
            Some(user) => json!({
                "user_id": user.id,
                "balance": user.balance,
                "balance_formatted": group_thousands(user.balance),
                "last_updated": UPDATED_AT,
                "created_at": CREATED_AT,
            }),
            None => error(format!("Balance not found for user {}", user_id)),
        }
    }

    fn points(&self, user_id: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        match self.find(user_id) {
            Some(user) => json!({
                "user_id": user.id,
                "points": user.points,
                "points_formatted": group_thousands(user.points),
                "last_updated": UPDATED_AT,
            }),
            None => error(format!("Points not found for user {}", user_id)),
        }
    }

    fn balance_info(&self, user_id: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        match self.find(user_id) {
            Some(user) => json!({
                "user_id": user.id,
                "balance": {
                    "amount": user.balance,
                    "formatted": group_thousands(user.balance)
                },
                "points": {
                    "amount": user.points,
                    "formatted": group_thousands(user.points)
                },
                "timestamps": {
                    "created_at": CREATED_AT,
                    "last_updated": UPDATED_AT
                }
            }),
            None => error(format!("Balance information not found for user {}", user_id)),
        }
    }

    fn top_balances(&self, limit: usize) -> Value {
        let mut ranked: Vec<&DemoUser> = self.users.iter().collect();
        ranked.sort_by(|a, b| b.balance.cmp(&a.balance));
        let top: Vec<Value> = ranked.into_iter().take(limit).map(Self::balance_entry).collect();
        json!({
            "count": top.len(),
            "top_balances": top,
            "limit": limit,
        })
    }

    fn balance_stats(&self) -> Value {
        let total: i64 = self.users.iter().map(|u| u.balance).sum();
        let count = self.users.len() as i64;
        json!({
            "statistics": {
                "total_users": count,
                "total_balance": total,
                "average_balance": if count > 0 { total / count } else { 0 },
                "max_balance": self.users.iter().map(|u| u.balance).max().unwrap_or(0),
                "total_points": self.users.iter().map(|u| u.points).sum::<i64>(),
            }
        })
    }

    fn search_balances(&self, user_ids: Option<&Vec<Value>>) -> Value {
        let Some(user_ids) = user_ids.filter(|ids| !ids.is_empty()) else {
            return error("user_ids list is required");
        };
        let found: Vec<Value> = user_ids
            .iter()
            .filter_map(Value::as_str)
            .filter_map(|id| self.find(id))
            .map(Self::balance_entry)
            .collect();
        json!({
            "count": found.len(),
            "balances": found,
            "searched_count": user_ids.len(),
        })
    }

    fn query(&self, user_id: Option<&str>, query: Option<&str>) -> Value {
        let Some(user_id) = user_id else {
            return error("user_id is required");
        };
        let Some(query) = query else {
            return error("query is required");
        };
        let query = query.to_lowercase();

        let Some(user) = self.find(user_id) else {
            if user_id != ANONYMOUS {
                return error(format!("User {} not found", user_id));
            }
            return if query.contains("name") {
                json!({"result": {"full_name": "Khách hàng", "firstName": "Khách", "lastName": "hàng"}})
            } else {
                json!({"result": {"summary": "Khách hàng ẩn danh", "role": "guest"}})
            };
        };

        let result = if query.contains("name") {
            json!({
                "full_name": user.full_name(),
                "firstName": user.first_name,
                "lastName": user.last_name,
                "nickname": user.nickname,
            })
        } else if ["contact", "email", "phone"].iter().any(|k| query.contains(k)) {
            json!({"email": user.email, "phone": user.phone})
        } else if query.contains("role") || query.contains("permission") {
            json!({"role": user.role, "level": user.level, "isActive": true, "verified": true})
        } else if query.contains("store") {
            json!({"storeId": user.store_id})
        } else if ["balance", "điểm", "point"].iter().any(|k| query.contains(k)) {
            json!({
                "balance": {
                    "amount": user.balance,
                    "formatted": group_thousands(user.balance),
                    "points": user.points,
                    "points_formatted": group_thousands(user.points),
                    "last_updated": UPDATED_AT,
                },
                "summary": format!(
                    "Balance: {}, Points: {}",
                    group_thousands(user.balance),
                    group_thousands(user.points)
                ),
            })
        } else {
            json!({
                "summary": format!("User {} ({})", user.full_name(), user.role),
                "basic_info": Self::basic(user),
            })
        };

        json!({ "result": result })
    }
}

#[async_trait]
impl ProviderHandler for DemoUserProvider {
    fn name(&self) -> &str {
        "demo-user-provider"
    }

    fn methods(&self) -> Vec<&'static str> {
        methods::USER_METHODS.to_vec()
    }

    async fn handle(&self, method: &str, params: &Value) -> Result<Option<Value>> {
        let user_id = param_str(params, "user_id");
        let result = match method {
            methods::GET_USER_PROFILE => self.profile(user_id),
            methods::GET_USER_BY_EMAIL => self.by_email(param_str(params, "email")),
            methods::GET_USER_BY_USERNAME => self.by_username(param_str(params, "username")),
            methods::QUERY_USER_DATA => self.query(user_id, param_str(params, "query")),
            methods::GET_USER_BALANCE => self.balance(user_id),
            methods::GET_USER_POINTS => self.points(user_id),
            methods::GET_BALANCE_INFO => self.balance_info(user_id),
            methods::GET_TOP_BALANCES => {
                let limit = params.get("limit").and_then(Value::as_u64).unwrap_or(10);
                self.top_balances(limit as usize)
            }
            methods::GET_BALANCE_STATS => self.balance_stats(),
            methods::SEARCH_USER_BALANCES => {
                self.search_balances(params.get("user_ids").and_then(Value::as_array))
            }
            _ => return Ok(None),
        };
        Ok(Some(result))
    }
}
