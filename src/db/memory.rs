//! In-process store used by handler tests.

use super::*;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: Vec<DbUser>,
    goals: Vec<GoalEntry>,
    plans: Vec<PlanRecord>,
    saved_plans: Vec<SavedPlan>,
    feedback: Vec<NewFeedback>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    fail_plan_writes: std::sync::atomic::AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_plan_writes(&self) {
        self.fail_plan_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub async fn plan_count(&self) -> usize {
        self.tables.read().await.plans.len()
    }

    pub async fn feedback_count(&self) -> usize {
        self.tables.read().await.feedback.len()
    }

    pub async fn saved_plans(&self) -> Vec<SavedPlan> {
        self.tables.read().await.saved_plans.clone()
    }

    pub async fn insert_raw_plan(&self, name: &str, goal: &str, plan_json: &str) -> i64 {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.plans.push(PlanRecord {
            id,
            name: name.to_string(),
            goal: goal.to_string(),
            plan_json: plan_json.to_string(),
            created_at: Utc::now(),
        });
        id
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_id(&self, user_id: i64) -> Result<Option<DbUser>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<DbUser>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<DbUser, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Email exists".to_string()));
        }
        let created = DbUser {
            user_id: tables.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            age: user.age,
            gender: user.gender,
            height_cm: user.height_cm,
            weight_kg: user.weight_kg,
            created_at: Utc::now(),
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn update_body_metrics(&self, user_id: i64, height_cm: f64, weight_kg: f64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.user_id == user_id) {
            Some(user) => {
                user.height_cm = Some(height_cm);
                user.weight_kg = Some(weight_kg);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.user_id != user_id);
        tables.goals.retain(|g| g.user_id != user_id);
        tables.saved_plans.retain(|p| p.user_id != user_id);
        Ok(tables.users.len() != before)
    }

    async fn list_users(&self) -> Result<Vec<DbUser>, StoreError> {
        let tables = self.tables.read().await;
        let mut users = tables.users.clone();
        users.sort_by(|a, b| b.user_id.cmp(&a.user_id));
        Ok(users)
    }
}

#[async_trait]
impl GoalLog for MemoryStore {
    async fn append_goal(&self, user_id: i64, goal_type: &str) -> Result<GoalEntry, StoreError> {
        let mut tables = self.tables.write().await;
        let entry = GoalEntry {
            goal_id: tables.next_id(),
            user_id,
            goal_type: goal_type.to_string(),
            created_at: Utc::now(),
        };
        tables.goals.push(entry.clone());
        Ok(entry)
    }

    async fn latest_goal(&self, user_id: i64) -> Result<Option<GoalEntry>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .max_by_key(|g| (g.created_at, g.goal_id))
            .cloned())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn insert_plan(&self, plan: NewPlanRecord) -> Result<i64, StoreError> {
        if self.fail_plan_writes.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.plans.push(PlanRecord {
            id,
            name: plan.name,
            goal: plan.goal,
            plan_json: plan.plan_json,
            created_at: plan.created_at,
        });
        Ok(id)
    }

    async fn list_plans(&self) -> Result<Vec<PlanRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut plans = tables.plans.clone();
        plans.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(plans)
    }

    async fn delete_plan(&self, id: i64) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.plans.len();
        tables.plans.retain(|p| p.id != id);
        Ok(tables.plans.len() != before)
    }

    async fn insert_saved_plan(&self, user_id: i64, plan_type: &str, plan_name: &str) -> Result<SavedPlan, StoreError> {
        let mut tables = self.tables.write().await;
        let saved = SavedPlan {
            id: tables.next_id(),
            user_id,
            plan_type: plan_type.to_string(),
            plan_name: plan_name.to_string(),
            created_at: Utc::now(),
        };
        tables.saved_plans.push(saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl FeedbackStore for MemoryStore {
    async fn insert_feedback(&self, feedback: NewFeedback) -> Result<i64, StoreError> {
        let mut tables = self.tables.write().await;
        let id = tables.next_id();
        tables.feedback.push(feedback);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            age: Some(30),
            gender: Some("female".to_string()),
            height_cm: Some(165.0),
            weight_kg: Some(60.0),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com")).await.unwrap();
        let err = store.insert_user(new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_latest_goal_wins() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("b@example.com")).await.unwrap();
        assert!(store.latest_goal(user.user_id).await.unwrap().is_none());

        store.append_goal(user.user_id, "weight loss").await.unwrap();
        store.append_goal(user.user_id, "muscle gain").await.unwrap();
        let latest = store.latest_goal(user.user_id).await.unwrap().unwrap();
        assert_eq!(latest.goal_type, "muscle gain");
    }
}
