//! Database service for backoffice-service.

use crate::models::{
    Customer, CustomerFilter, CustomerRow, CustomerStatus, DistributionPoint, Invoice,
    InvoiceDetail, InvoiceFilter, LedgerDirection, NewCustomer, NewInvoice, Package, Payment,
    PaymentPosting, RegisteredCustomer, CUSTOMER_PAYMENT_CATEGORY,
};
use crate::services::invoice_number::{format_invoice_id, invoice_prefix, period_key};
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::BackofficeStore;
use async_trait::async_trait;
use chrono::NaiveDate;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

const CUSTOMER_COLUMNS: &str = r#"
    customer_id, name, address, phone, email, registered_at, expires_at, status,
    pppoe_username, pppoe_password, router_profile, package_id, distribution_point_id,
    port_id, onu_id, last_paid_at, created_utc
"#;

/// Shared WHERE clause for the customer listing. `$1` is an escaped ILIKE
/// pattern, `$2` a status literal, `$3` a package id, `$4` a distribution
/// point id; NULL disables a filter.
const CUSTOMER_FILTER: &str = r#"
    ($1::text IS NULL
        OR c.name ILIKE $1 ESCAPE '\'
        OR c.address ILIKE $1 ESCAPE '\'
        OR c.phone ILIKE $1 ESCAPE '\'
        OR c.pppoe_username ILIKE $1 ESCAPE '\')
    AND ($2::text IS NULL OR c.status = $2)
    AND ($3::bigint IS NULL OR c.package_id = $3)
    AND ($4::bigint IS NULL OR c.distribution_point_id = $4)
"#;

const INVOICE_DETAIL_SELECT: &str = r#"
    SELECT i.invoice_id, i.customer_id, i.period_month, i.period_year, i.amount, i.due_at,
           i.status, i.description,
           c.name AS customer_name, c.address AS customer_address, c.phone AS customer_phone,
           c.pppoe_username, c.expires_at AS customer_expires_at,
           p.name AS package_name, p.price AS package_price
    FROM invoices i
    JOIN customers c ON c.customer_id = i.customer_id
    LEFT JOIN packages p ON p.package_id = c.package_id
"#;

/// `$1` is the requested status (NULL for all), `$2` today's date.
const INVOICE_FILTER: &str = r#"
    ($1::text IS NULL
        OR ($1 = 'paid' AND i.status = 'paid')
        OR ($1 = 'unpaid' AND i.status IN ('unpaid', 'overdue'))
        OR ($1 = 'overdue' AND i.status IN ('unpaid', 'overdue') AND i.due_at < $2::date))
"#;

/// Case-insensitive substring pattern with LIKE wildcards in the term
/// matched literally.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "backoffice-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests that manage their own schema).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl BackofficeStore for Database {
    /// Check database health.
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Customer Directory
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn count_customers(&self, filter: &CustomerFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_customers"])
            .start_timer();

        let sql = format!("SELECT COUNT(*) FROM customers c WHERE {}", CUSTOMER_FILTER);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.package_id)
            .bind(filter.distribution_point_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count customers: {}", e))
            })?;

        timer.observe_duration();

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CustomerRow>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_customers"])
            .start_timer();

        // Page first, then enrich only the rows on the page.
        let sql = format!(
            r#"
            WITH page AS (
                SELECT c.*
                FROM customers c
                WHERE {}
                ORDER BY c.created_utc DESC, c.customer_id DESC
                LIMIT $5 OFFSET $6
            )
            SELECT pg.customer_id, pg.name, pg.address, pg.phone, pg.email, pg.registered_at,
                   pg.expires_at, pg.status, pg.pppoe_username, pg.onu_id, pg.last_paid_at,
                   pg.created_utc,
                   p.name AS package_name, p.price AS package_price, p.rx_limit, p.tx_limit,
                   d.name AS distribution_point_name, d.location AS distribution_point_location,
                   d.status AS distribution_point_status,
                   dp.name AS port_name, dp.status AS port_status,
                   (SELECT COUNT(*) FROM invoices i
                     WHERE i.customer_id = pg.customer_id
                       AND i.status IN ('unpaid', 'overdue')) AS unpaid_invoices,
                   (SELECT COUNT(*) FROM payments pm
                     WHERE pm.customer_id = pg.customer_id) AS payment_count,
                   (SELECT COUNT(*) FROM pppoe_sessions s
                     WHERE s.customer_id = pg.customer_id
                       AND s.status = 'active') AS active_sessions
            FROM page pg
            LEFT JOIN packages p ON p.package_id = pg.package_id
            LEFT JOIN distribution_points d ON d.distribution_point_id = pg.distribution_point_id
            LEFT JOIN distribution_ports dp ON dp.port_id = pg.port_id
            ORDER BY pg.created_utc DESC, pg.customer_id DESC
            "#,
            CUSTOMER_FILTER
        );

        let rows = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(filter.search.as_deref().map(like_pattern))
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.package_id)
            .bind(filter.distribution_point_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list customers: {}", e))
            })?;

        timer.observe_duration();

        Ok(rows)
    }

    #[instrument(skip(self))]
    async fn list_active_packages(&self) -> Result<Vec<Package>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_active_packages"])
            .start_timer();

        let packages = sqlx::query_as::<_, Package>(
            r#"
            SELECT package_id, name, price, rx_limit, tx_limit, profile_name, status, created_utc
            FROM packages
            WHERE status = 'active'
            ORDER BY name, package_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list packages: {}", e)))?;

        timer.observe_duration();

        Ok(packages)
    }

    #[instrument(skip(self))]
    async fn list_active_distribution_points(&self) -> Result<Vec<DistributionPoint>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_active_distribution_points"])
            .start_timer();

        let points = sqlx::query_as::<_, DistributionPoint>(
            r#"
            SELECT distribution_point_id, name, location, status, created_utc
            FROM distribution_points
            WHERE status = 'active'
            ORDER BY name, distribution_point_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to list distribution points: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(points)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn get_customer(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_customer"])
            .start_timer();

        let sql = format!("SELECT {} FROM customers WHERE customer_id = $1", CUSTOMER_COLUMNS);
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to get customer: {}", e))
            })?;

        timer.observe_duration();

        Ok(customer)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id, status = %status.as_str()))]
    async fn update_customer_status(
        &self,
        customer_id: i64,
        status: CustomerStatus,
    ) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_customer_status"])
            .start_timer();

        let result = sqlx::query("UPDATE customers SET status = $2 WHERE customer_id = $1")
            .bind(customer_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to update customer status: {}", e))
            })?;

        timer.observe_duration();

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(customer_id = %customer_id))]
    async fn delete_customer(&self, customer_id: i64) -> Result<Option<Customer>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_customer"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let sql = format!(
            "SELECT {} FROM customers WHERE customer_id = $1 FOR UPDATE",
            CUSTOMER_COLUMNS
        );
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(customer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to lock customer: {}", e))
            })?;

        let Some(customer) = customer else {
            tx.rollback().await.ok();
            return Ok(None);
        };

        for (table, label) in [
            ("pppoe_sessions", "sessions"),
            ("payments", "payments"),
            ("invoices", "invoices"),
            ("customers", "customer"),
        ] {
            sqlx::query(&format!("DELETE FROM {} WHERE customer_id = $1", table))
                .bind(customer_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to delete {}: {}", label, e))
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            customer_id = customer.customer_id,
            pppoe_username = %customer.pppoe_username,
            "Customer deleted"
        );

        Ok(Some(customer))
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    #[instrument(skip(self), fields(package_id = %package_id))]
    async fn get_package(&self, package_id: i64) -> Result<Option<Package>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_package"])
            .start_timer();

        let package = sqlx::query_as::<_, Package>(
            r#"
            SELECT package_id, name, price, rx_limit, tx_limit, profile_name, status, created_utc
            FROM packages
            WHERE package_id = $1
            "#,
        )
        .bind(package_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get package: {}", e)))?;

        timer.observe_duration();

        Ok(package)
    }

    #[instrument(skip(self))]
    async fn pppoe_username_exists(&self, username: &str) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["pppoe_username_exists"])
            .start_timer();

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM customers WHERE pppoe_username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to check PPPoE username: {}", e))
        })?;

        timer.observe_duration();

        Ok(exists)
    }

    #[instrument(skip(self, customer, invoice), fields(pppoe_username = %customer.pppoe_username))]
    async fn register_customer(
        &self,
        customer: &NewCustomer,
        invoice: &NewInvoice,
        issued_on: NaiveDate,
    ) -> Result<RegisteredCustomer, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["register_customer"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let sql = format!(
            r#"
            INSERT INTO customers (
                name, address, phone, email, registered_at, expires_at, status,
                pppoe_username, pppoe_password, router_profile, package_id,
                distribution_point_id, port_id, onu_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            CUSTOMER_COLUMNS
        );
        let inserted = sqlx::query_as::<_, Customer>(&sql)
            .bind(&customer.name)
            .bind(&customer.address)
            .bind(&customer.phone)
            .bind(&customer.email)
            .bind(customer.registered_at)
            .bind(customer.expires_at)
            .bind(&customer.pppoe_username)
            .bind(&customer.pppoe_password)
            .bind(&customer.router_profile)
            .bind(customer.package_id)
            .bind(customer.distribution_point_id)
            .bind(customer.port_id)
            .bind(&customer.onu_id)
            .fetch_one(&mut *tx)
            .await;

        let inserted = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await.ok();
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Username {} is already in use",
                    customer.pppoe_username
                )));
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to save customer: {}",
                    e
                )));
            }
        };

        let prefix = invoice_prefix(issued_on);
        let sequence = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO invoice_sequences (period, last_value)
            VALUES (
                $1,
                COALESCE((
                    SELECT MAX(CAST(RIGHT(invoice_id, 4) AS INTEGER))
                    FROM invoices
                    WHERE invoice_id LIKE $2::text || '%'
                      AND LENGTH(invoice_id) = LENGTH($2::text) + 4
                      AND RIGHT(invoice_id, 4) ~ '^[0-9]{4}$'
                ), 0) + 1
            )
            ON CONFLICT (period) DO UPDATE
            SET last_value = GREATEST(invoice_sequences.last_value, EXCLUDED.last_value - 1) + 1
            RETURNING last_value
            "#,
        )
        .bind(period_key(issued_on))
        .bind(&prefix)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to allocate invoice id: {}", e))
        })?;

        let invoice_id = format_invoice_id(&prefix, sequence);

        let created_invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_id, customer_id, period_month, period_year, amount, due_at,
                status, description, auto_generated
            )
            VALUES ($1, $2, $3, $4, $5, $6, 'unpaid', $7, $8)
            RETURNING invoice_id, customer_id, period_month, period_year, amount, due_at,
                status, description, auto_generated, created_utc
            "#,
        )
        .bind(&invoice_id)
        .bind(inserted.customer_id)
        .bind(invoice.period_month)
        .bind(invoice.period_year)
        .bind(invoice.amount)
        .bind(invoice.due_at)
        .bind(&invoice.description)
        .bind(invoice.auto_generated)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create invoice: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            customer_id = inserted.customer_id,
            invoice_id = %created_invoice.invoice_id,
            amount = %created_invoice.amount,
            "Customer registered with first invoice"
        );

        Ok(RegisteredCustomer {
            customer: inserted,
            invoice: created_invoice,
        })
    }

    // -------------------------------------------------------------------------
    // Invoices & Payments
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    async fn get_invoice_detail(&self, invoice_id: &str) -> Result<Option<InvoiceDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_invoice_detail"])
            .start_timer();

        let sql = format!("{} WHERE i.invoice_id = $1", INVOICE_DETAIL_SELECT);
        let detail = sqlx::query_as::<_, InvoiceDetail>(&sql)
            .bind(invoice_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get invoice: {}", e)))?;

        timer.observe_duration();

        Ok(detail)
    }

    #[instrument(skip(self))]
    async fn count_invoices(&self, filter: &InvoiceFilter) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_invoices"])
            .start_timer();

        let sql = format!("SELECT COUNT(*) FROM invoices i WHERE {}", INVOICE_FILTER);
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.today)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e))
            })?;

        timer.observe_duration();

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn list_invoices(
        &self,
        filter: &InvoiceFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<InvoiceDetail>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let sql = format!(
            "{} WHERE {} ORDER BY i.due_at DESC, i.invoice_id DESC LIMIT $3 OFFSET $4",
            INVOICE_DETAIL_SELECT, INVOICE_FILTER
        );
        let invoices = sqlx::query_as::<_, InvoiceDetail>(&sql)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.today)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e))
            })?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self, posting), fields(invoice_id = %posting.invoice_id, method = %posting.method.as_str()))]
    async fn post_payment(&self, posting: &PaymentPosting) -> Result<Payment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["post_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        // Conditional update: a concurrent payment of the same invoice loses here.
        let marked = sqlx::query(
            "UPDATE invoices SET status = 'paid' WHERE invoice_id = $1 AND status <> 'paid'",
        )
        .bind(&posting.invoice_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update invoice status: {}", e))
        })?;

        if marked.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Invoice has already been paid"
            )));
        }

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            INSERT INTO payments (invoice_id, customer_id, paid_at, amount, method, note, recorded_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING payment_id, invoice_id, customer_id, paid_at, amount, method, note,
                recorded_by, created_utc
            "#,
        )
        .bind(&posting.invoice_id)
        .bind(posting.customer_id)
        .bind(posting.paid_at)
        .bind(posting.amount_paid)
        .bind(posting.method.as_str())
        .bind(&posting.payment_note)
        .bind(posting.recorded_by)
        .fetch_one(&mut *tx)
        .await;

        let payment = match payment {
            Ok(payment) => payment,
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                tx.rollback().await.ok();
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "Invoice has already been paid"
                )));
            }
            Err(e) => {
                tx.rollback().await.ok();
                return Err(AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to save payment: {}",
                    e
                )));
            }
        };

        sqlx::query(
            r#"
            INSERT INTO ledger_entries (entry_date, direction, category, note, amount, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(posting.paid_at)
        .bind(LedgerDirection::Income.as_str())
        .bind(CUSTOMER_PAYMENT_CATEGORY)
        .bind(&posting.ledger_note)
        .bind(posting.amount_paid)
        .bind(posting.recorded_by)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to save ledger entry: {}", e))
        })?;

        sqlx::query(
            r#"
            UPDATE customers
            SET last_paid_at = $2,
                expires_at = GREATEST(COALESCE(expires_at, $3), $3)
            WHERE customer_id = $1
            "#,
        )
        .bind(posting.customer_id)
        .bind(posting.paid_at)
        .bind(posting.extend_expiry_to)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update customer expiry: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        timer.observe_duration();

        info!(
            payment_id = payment.payment_id,
            invoice_id = %payment.invoice_id,
            amount = %payment.amount,
            "Payment posted"
        );

        Ok(payment)
    }
}
