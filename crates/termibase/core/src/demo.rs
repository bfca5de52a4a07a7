// TermiBase
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.


//! Sample schema and teaching queries for the sandbox database.

use serde::Serialize;
use tracing::info;

use crate::storage::{SqliteStorage, StorageResult};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age INTEGER,
    city TEXT
);
CREATE TABLE IF NOT EXISTS orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER,
    amount REAL,
    date TEXT,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
CREATE INDEX IF NOT EXISTS idx_users_city ON users(city);
CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id);
";

const USERS: [(i64, &str, i64, &str); 8] = [
    (1, "Alice", 25, "New York"),
    (2, "Bob", 30, "San Francisco"),
    (3, "Charlie", 35, "New York"),
    (4, "Diana", 28, "Boston"),
    (5, "Eve", 32, "San Francisco"),
    (6, "Frank", 27, "Chicago"),
    (7, "Grace", 29, "New York"),
    (8, "Henry", 31, "Boston"),
];

const ORDERS: [(i64, f64, &str); 12] = [
    (1, 150.00, "2024-01-15"),
    (1, 75.50, "2024-02-20"),
    (2, 200.00, "2024-01-10"),
    (2, 120.00, "2024-03-05"),
    (3, 90.00, "2024-02-14"),
    (4, 300.00, "2024-01-25"),
    (4, 50.00, "2024-03-10"),
    (5, 180.00, "2024-02-01"),
    (6, 95.00, "2024-01-30"),
    (7, 220.00, "2024-02-15"),
    (7, 110.00, "2024-03-20"),
    (8, 160.00, "2024-01-20"),
];

/// Creates the `users` and `orders` tables with their indexes and replaces
/// their contents with the sample rows. Safe to run repeatedly.
pub fn seed(storage: &SqliteStorage) -> StorageResult<()> {
    storage.execute_batch(SCHEMA)?;

    storage.transaction(|conn| {
        // orders first, they reference users
        conn.execute("DELETE FROM orders", [])?;
        conn.execute("DELETE FROM users", [])?;

        let mut insert_user = conn.prepare("INSERT INTO users (id, name, age, city) VALUES (?1, ?2, ?3, ?4)")?;
        for (id, name, age, city) in USERS {
            insert_user.execute(rusqlite::params![id, name, age, city])?;
        }

        let mut insert_order = conn.prepare("INSERT INTO orders (user_id, amount, date) VALUES (?1, ?2, ?3)")?;
        for (user_id, amount, date) in ORDERS {
            insert_order.execute(rusqlite::params![user_id, amount, date])?;
        }
        Ok(())
    })?;

    info!(users = USERS.len(), orders = ORDERS.len(), "Seeded demo data");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoQuery {
    pub query: &'static str,
    pub description: &'static str,
}

/// A named group of queries walked through by `termibase demo`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoSet {
    pub name: &'static str,
    pub queries: Vec<DemoQuery>,
}

fn set(name: &'static str, queries: &[(&'static str, &'static str)]) -> DemoSet {
    DemoSet {
        name,
        queries: queries.iter().map(|&(query, description)| DemoQuery { query, description }).collect(),
    }
}

pub fn demo_queries() -> Vec<DemoSet> {
    vec![
        set(
            "basics",
            &[
                ("SELECT * FROM users", "Simple SELECT query - observe full table scan"),
                ("SELECT name, age FROM users WHERE age > 28", "SELECT with WHERE filter - see how filtering works"),
                ("SELECT * FROM users ORDER BY age DESC", "SELECT with ORDER BY - observe sorting operation"),
                ("SELECT city, COUNT(*) as user_count FROM users GROUP BY city", "GROUP BY aggregation - see grouping in action"),
            ],
        ),
        set(
            "joins",
            &[
                ("SELECT u.name, o.amount, o.date FROM users u JOIN orders o ON u.id = o.user_id", "INNER JOIN - see how tables are combined"),
                (
                    "SELECT u.name, SUM(o.amount) as total_spent FROM users u LEFT JOIN orders o ON u.id = o.user_id GROUP BY u.id, u.name",
                    "LEFT JOIN with aggregation - observe join strategy",
                ),
            ],
        ),
        set(
            "indexes",
            &[
                ("SELECT * FROM users WHERE city = 'New York'", "Query using indexed column - compare with table scan"),
                ("SELECT * FROM users WHERE age > 30", "Query on non-indexed column - see full table scan"),
            ],
        ),
        set(
            "advanced",
            &[
                (
                    "SELECT u.name, COUNT(o.id) as order_count, SUM(o.amount) as total FROM users u LEFT JOIN orders o ON u.id = o.user_id GROUP BY u.id, u.name HAVING COUNT(o.id) > 1 ORDER BY total DESC",
                    "Complex query with JOIN, GROUP BY, HAVING, and ORDER BY",
                ),
                ("SELECT city, AVG(age) as avg_age FROM users GROUP BY city HAVING AVG(age) > 28 ORDER BY avg_age", "Aggregation with HAVING clause"),
            ],
        ),
    ]
}

/// Looks up a demo set by name, case-insensitively.
pub fn find_demo(name: &str) -> Option<DemoSet> {
    demo_queries().into_iter().find(|set| set.name.eq_ignore_ascii_case(name))
}
