use std::sync::Arc;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbBackend, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Statement,
    TransactionTrait,
};
use serde_json::{Value, json};
use uuid::Uuid;

use hms_auth_schema::{
    credentials, hospitals, key_rotations, roles, security_events, sessions, staff, users,
};
use hms_pii::FieldCodec;

use crate::domain::repository::{
    CredentialRepository, KeyRotationRepository, SecurityEventRepository, SessionRepository,
    TenantRepository, UserRepository,
};
use crate::domain::types::{
    Credential, Hospital, KeyRotation, MfaConfig, Membership, PASSWORD_PROVIDER, PiiRewrite,
    Role, SecurityEvent, Session, Staff, User,
};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

/// Users table behind the PII codec: rows hold ciphertext, callers see plaintext.
#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
    pub codec: Arc<FieldCodec>,
}

impl DbUserRepository {
    fn decode(&self, model: users::Model) -> Result<User, AuthServiceError> {
        let mfa_config = model
            .mfa_config
            .filter(|v| !v.is_null())
            .map(serde_json::from_value::<MfaConfig>)
            .transpose()
            .context("decode mfa_config")?;
        let stored = User {
            id: model.id,
            email: model.email,
            name: model.name,
            phone: model.phone,
            mfa_config,
            last_login_at: model.last_login_at,
        };
        let user = self
            .codec
            .decode_from_storage(stored)
            .context("decode user pii")?;
        Ok(user)
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthServiceError> {
        // Stored addresses keep the case they were registered with.
        let model = users::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(users::Column::Email)))
                    .eq(email.to_lowercase()),
            )
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(|m| self.decode(m)).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(|m| self.decode(m)).transpose()
    }

    async fn list_ids(&self) -> Result<Vec<Uuid>, AuthServiceError> {
        let ids = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .order_by_asc(users::Column::Id)
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await
            .context("list user ids")?;
        Ok(ids)
    }

    async fn reencrypt_pii(
        &self,
        user_id: Uuid,
        current_key_id: &str,
    ) -> Result<PiiRewrite, AuthServiceError> {
        let txn = self.db.begin().await.context("begin pii re-encryption")?;
        let Some(model) = users::Entity::find_by_id(user_id)
            .lock_exclusive()
            .one(&txn)
            .await
            .context("lock user for re-encryption")?
        else {
            return Ok(PiiRewrite::Missing);
        };

        // Only the encrypted values travel; enabled and backup_codes stay in the row.
        let secret = model
            .mfa_config
            .as_ref()
            .and_then(|cfg| cfg.get("secret"))
            .cloned()
            .unwrap_or(Value::Null);
        let mut doc = json!({
            "name": model.name,
            "phone": model.phone,
            "mfa_config": { "secret": secret },
        });
        self.codec.decode_document(&mut doc);
        self.codec
            .encode_document(&mut doc)
            .context("re-encrypt user pii")?;

        let text = |v: &Value| v.as_str().map(str::to_owned);
        txn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            r#"UPDATE users
               SET name = $2,
                   phone = $3,
                   mfa_config = CASE
                       WHEN $4::text IS NOT NULL AND jsonb_exists(mfa_config, 'secret')
                       THEN jsonb_set(mfa_config, '{secret}', to_jsonb($4::text))
                       ELSE mfa_config
                   END,
                   updated_at = now()
               WHERE id = $1"#,
            [
                user_id.into(),
                text(&doc["name"]).into(),
                text(&doc["phone"]).into(),
                text(&doc["mfa_config"]["secret"]).into(),
            ],
        ))
        .await
        .context("write re-encrypted pii")?;
        txn.commit().await.context("commit pii re-encryption")?;

        let mut stale: Vec<String> = self
            .codec
            .key_ids(&doc)
            .into_iter()
            .filter(|id| id != current_key_id)
            .collect();
        stale.sort();
        stale.dedup();
        Ok(if stale.is_empty() {
            PiiRewrite::Current
        } else {
            PiiRewrite::Stale(stale)
        })
    }

    async fn set_mfa_config(
        &self,
        user_id: Uuid,
        config: Option<&MfaConfig>,
    ) -> Result<(), AuthServiceError> {
        let mut doc = json!({ "mfa_config": config });
        self.codec
            .encode_document(&mut doc)
            .context("encrypt mfa secret")?;
        let value = doc
            .get_mut("mfa_config")
            .map(serde_json::Value::take)
            .filter(|v| !v.is_null());
        users::ActiveModel {
            id: Set(user_id),
            mfa_config: Set(value),
            updated_at: Set(Utc::now()),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("set mfa config")?;
        Ok(())
    }

    async fn consume_backup_code(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> Result<Option<usize>, AuthServiceError> {
        // Match and remove in one statement; a concurrent caller gets no row back.
        let row = self
            .db
            .query_one(Statement::from_sql_and_values(
                DbBackend::Postgres,
                r#"UPDATE users
                   SET mfa_config = jsonb_set(mfa_config, '{backup_codes}', (mfa_config -> 'backup_codes') - $2::text),
                       updated_at = now()
                   WHERE id = $1
                     AND jsonb_exists(mfa_config -> 'backup_codes', $2::text)
                   RETURNING jsonb_array_length(mfa_config -> 'backup_codes') AS remaining"#,
                [user_id.into(), code.into()],
            ))
            .await
            .context("consume backup code")?;
        let remaining = row
            .map(|r| r.try_get::<i32>("", "remaining"))
            .transpose()
            .context("read remaining backup codes")?;
        Ok(remaining.map(|n| n.max(0) as usize))
    }

    async fn touch_last_login(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(user_id),
            last_login_at: Set(Some(at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("update last login")?;
        Ok(())
    }
}

// ── Credential repository ─────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbCredentialRepository {
    pub db: DatabaseConnection,
}

impl CredentialRepository for DbCredentialRepository {
    async fn find_password(&self, user_id: Uuid) -> Result<Option<Credential>, AuthServiceError> {
        let model = credentials::Entity::find()
            .filter(credentials::Column::UserId.eq(user_id))
            .filter(credentials::Column::ProviderId.eq(PASSWORD_PROVIDER))
            .one(&self.db)
            .await
            .context("find password credential")?;
        Ok(model.map(|m| Credential {
            id: m.id,
            user_id: m.user_id,
            provider_id: m.provider_id,
            password_hash: m.password_hash,
        }))
    }

    async fn update_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<(), AuthServiceError> {
        credentials::Entity::update_many()
            .col_expr(
                credentials::Column::PasswordHash,
                Expr::value(password_hash),
            )
            .col_expr(
                credentials::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(credentials::Column::UserId.eq(user_id))
            .filter(credentials::Column::ProviderId.eq(PASSWORD_PROVIDER))
            .exec(&self.db)
            .await
            .context("update password")?;
        Ok(())
    }
}

// ── Tenant repository ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbTenantRepository {
    pub db: DatabaseConnection,
}

impl TenantRepository for DbTenantRepository {
    async fn find_hospital(&self, id: Uuid) -> Result<Option<Hospital>, AuthServiceError> {
        let model = hospitals::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find hospital")?;
        model.map(hospital_from_model).transpose()
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Staff>, AuthServiceError> {
        let model = staff::Entity::find()
            .filter(staff::Column::UserId.eq(user_id))
            .filter(staff::Column::TenantId.eq(tenant_id))
            .one(&self.db)
            .await
            .context("find staff membership")?;
        model.map(staff_from_model).transpose()
    }

    async fn list_memberships(&self, user_id: Uuid) -> Result<Vec<Membership>, AuthServiceError> {
        let rows = staff::Entity::find()
            .filter(staff::Column::UserId.eq(user_id))
            .find_also_related(hospitals::Entity)
            .all(&self.db)
            .await
            .context("list staff memberships")?;
        rows.into_iter()
            .filter_map(|(s, h)| h.map(|h| (s, h)))
            .map(|(s, h)| -> Result<Membership, AuthServiceError> {
                Ok(Membership {
                    staff: staff_from_model(s)?,
                    hospital: hospital_from_model(h)?,
                })
            })
            .collect()
    }

    async fn find_roles(
        &self,
        tenant_id: Uuid,
        role_ids: &[Uuid],
    ) -> Result<Vec<Role>, AuthServiceError> {
        if role_ids.is_empty() {
            return Ok(vec![]);
        }
        let models = roles::Entity::find()
            .filter(roles::Column::TenantId.eq(tenant_id))
            .filter(roles::Column::Id.is_in(role_ids.iter().copied()))
            .order_by_asc(roles::Column::Name)
            .all(&self.db)
            .await
            .context("find roles")?;
        models.into_iter().map(role_from_model).collect()
    }
}

fn hospital_from_model(model: hospitals::Model) -> Result<Hospital, AuthServiceError> {
    Ok(Hospital {
        id: model.id,
        name: model.name,
        status: model.status.parse().map_err(anyhow::Error::msg)?,
    })
}

fn staff_from_model(model: staff::Model) -> Result<Staff, AuthServiceError> {
    Ok(Staff {
        id: model.id,
        tenant_id: model.tenant_id,
        user_id: model.user_id,
        roles: serde_json::from_value(model.roles).context("decode staff roles")?,
        status: model.status.parse().map_err(anyhow::Error::msg)?,
    })
}

fn role_from_model(model: roles::Model) -> Result<Role, AuthServiceError> {
    Ok(Role {
        id: model.id,
        tenant_id: model.tenant_id,
        name: model.name,
        permissions: serde_json::from_value(model.permissions)
            .context("decode role permissions")?,
    })
}

// ── Session repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSessionRepository {
    pub db: DatabaseConnection,
}

impl SessionRepository for DbSessionRepository {
    async fn insert(&self, session: &Session) -> Result<(), AuthServiceError> {
        sessions::ActiveModel {
            token: Set(session.token.clone()),
            token_type: Set(session.kind.as_str().to_owned()),
            user_id: Set(session.user_id),
            tenant_id: Set(session.tenant_id),
            expires_at: Set(session.expires_at),
            created_at: Set(session.created_at),
        }
        .insert(&self.db)
        .await
        .context("insert session")?;
        Ok(())
    }

    async fn find(&self, token: &str) -> Result<Option<Session>, AuthServiceError> {
        let model = sessions::Entity::find_by_id(token.to_owned())
            .one(&self.db)
            .await
            .context("find session")?;
        model
            .map(|m| -> Result<Session, AuthServiceError> {
                Ok(Session {
                    kind: m.token_type.parse().map_err(anyhow::Error::msg)?,
                    token: m.token,
                    user_id: m.user_id,
                    tenant_id: m.tenant_id,
                    expires_at: m.expires_at,
                    created_at: m.created_at,
                })
            })
            .transpose()
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, AuthServiceError> {
        let result = sessions::Entity::delete_by_id(token.to_owned())
            .exec(&self.db)
            .await
            .context("delete session")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete_all_for_user(&self, user_id: Uuid) -> Result<u64, AuthServiceError> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .context("delete user sessions")?;
        Ok(result.rows_affected)
    }
}

// ── Security event repository ─────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSecurityEventRepository {
    pub db: DatabaseConnection,
}

impl SecurityEventRepository for DbSecurityEventRepository {
    async fn insert(&self, event: &SecurityEvent) -> Result<(), AuthServiceError> {
        security_events::ActiveModel {
            id: Set(event.id),
            event_type: Set(event.event_type.as_str().to_owned()),
            severity: Set(event.severity.as_str().to_owned()),
            tenant_id: Set(event.tenant_id),
            user_id: Set(event.user_id),
            ip: Set(event.ip.clone()),
            user_agent: Set(event.user_agent.clone()),
            details: Set(event.details.clone()),
            created_at: Set(event.timestamp),
        }
        .insert(&self.db)
        .await
        .context("insert security event")?;
        Ok(())
    }
}

// ── Key rotation repository ───────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbKeyRotationRepository {
    pub db: DatabaseConnection,
}

impl KeyRotationRepository for DbKeyRotationRepository {
    async fn latest(&self) -> Result<Option<KeyRotation>, AuthServiceError> {
        let model = key_rotations::Entity::find()
            .order_by_desc(key_rotations::Column::RotatedAt)
            .one(&self.db)
            .await
            .context("find latest key rotation")?;
        Ok(model.map(|m| KeyRotation {
            id: m.id,
            key_id: m.key_id,
            rotated_at: m.rotated_at,
            rotated_by: m.rotated_by,
            records_re_encrypted: m.records_re_encrypted.max(0) as u64,
        }))
    }

    async fn count(&self) -> Result<u64, AuthServiceError> {
        let count = key_rotations::Entity::find()
            .count(&self.db)
            .await
            .context("count key rotations")?;
        Ok(count)
    }

    async fn insert(&self, rotation: &KeyRotation) -> Result<(), AuthServiceError> {
        key_rotations::ActiveModel {
            id: Set(rotation.id),
            key_id: Set(rotation.key_id.clone()),
            rotated_at: Set(rotation.rotated_at),
            rotated_by: Set(rotation.rotated_by),
            records_re_encrypted: Set(rotation.records_re_encrypted as i64),
        }
        .insert(&self.db)
        .await
        .context("insert key rotation")?;
        Ok(())
    }
}
