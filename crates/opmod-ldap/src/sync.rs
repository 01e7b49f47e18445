//! Bring directory entries in line with LDIF records

use opmod_core::Change;
use tracing::{debug, info};

use crate::directory::Directory;
use crate::error::Result;
use crate::ldif::LdifRecord;
use crate::modlist::modify_list;

/// Applies desired entries to a [`Directory`].
///
/// In dry-run mode entries are still read so the reported changes are
/// accurate, but nothing is written.
pub struct EntrySync<'a, D: Directory + ?Sized> {
    directory: &'a mut D,
    remove_unset_attrs: bool,
    dry_run: bool,
}

impl<'a, D: Directory + ?Sized> EntrySync<'a, D> {
    pub fn new(directory: &'a mut D) -> Self {
        Self {
            directory,
            remove_unset_attrs: false,
            dry_run: false,
        }
    }

    pub fn remove_unset_attrs(mut self, remove: bool) -> Self {
        self.remove_unset_attrs = remove;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Add the entry, or modify it to match the record.
    pub async fn upsert(&mut self, record: &LdifRecord) -> Result<Change> {
        let existing = self.directory.read_entry(&record.dn).await?;

        let Some(existing) = existing else {
            info!("Adding {}", record.dn);
            if !self.dry_run {
                self.directory.add_entry(&record.dn, &record.attrs).await?;
            }
            return Ok(Change::create(&record.dn, "add entry"));
        };

        let mods = modify_list(&existing, &record.attrs, self.remove_unset_attrs);
        if mods.is_empty() {
            debug!("{} is up to date", record.dn);
            return Ok(Change::noop(&record.dn, "entry up to date"));
        }

        let description = mods
            .iter()
            .map(|m| m.describe())
            .collect::<Vec<_>>()
            .join(", ");
        info!("Modifying {}: {}", record.dn, description);
        if !self.dry_run {
            self.directory.modify_entry(&record.dn, &mods).await?;
        }
        Ok(Change::update(&record.dn, description))
    }

    pub async fn upsert_all(&mut self, records: &[LdifRecord]) -> Result<Vec<Change>> {
        let mut changes = Vec::with_capacity(records.len());
        for record in records {
            changes.push(self.upsert(record).await?);
        }
        Ok(changes)
    }

    /// Delete the entry when it exists.
    pub async fn delete(&mut self, dn: &str) -> Result<Change> {
        let deleted = if self.dry_run {
            self.directory.read_entry(dn).await?.is_some()
        } else {
            self.directory.delete_entry(dn).await?
        };

        if deleted {
            info!("Deleted {}", dn);
            Ok(Change::delete(dn, "delete entry"))
        } else {
            debug!("{} does not exist", dn);
            Ok(Change::noop(dn, "entry absent"))
        }
    }

    pub async fn delete_all(&mut self, dns: &[String]) -> Result<Vec<Change>> {
        let mut changes = Vec::with_capacity(dns.len());
        for dn in dns {
            changes.push(self.delete(dn).await?);
        }
        Ok(changes)
    }
}
