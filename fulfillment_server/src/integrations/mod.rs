pub mod payos;
