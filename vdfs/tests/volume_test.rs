// SPDX-License-Identifier: MIT

//! End-to-end checks over the synthesized volume: boot region bytes, VBR
//! checksum, FAT seed, root directory content and file data dispatch, all
//! through the public READ(10) surface.

use std::sync::Arc;

use vdfs::{FileContent, FileSpec, VirtualDisk, VolumeOptions};

const SECTOR: usize = 512;

fn new_disk(serial: u32) -> VirtualDisk {
    VirtualDisk::new(VolumeOptions::new("PicoVD", serial)).unwrap()
}

fn read_sector(disk: &mut VirtualDisk, lba: u32) -> [u8; SECTOR] {
    let mut buf = [0u8; SECTOR];
    assert_eq!(disk.read(lba, 0, &mut buf), SECTOR);
    buf
}

fn read_chunked(disk: &mut VirtualDisk, lba: u32, chunk: usize) -> [u8; SECTOR] {
    let mut buf = [0u8; SECTOR];
    for start in (0..SECTOR).step_by(chunk) {
        let end = (start + chunk).min(SECTOR);
        assert_eq!(disk.read(lba, start, &mut buf[start..end]), end - start);
    }
    buf
}

#[test]
fn boot_sector_fixed_bytes() {
    let mut disk = new_disk(0x1234_5678);
    let sector = read_sector(&mut disk, 0);

    assert_eq!(&sector[0..3], &[0xEB, 0x76, 0x90]);
    assert_eq!(&sector[3..11], b"EXFAT   ");
    // PartitionOffset is zero on an unpartitioned volume.
    assert_eq!(&sector[64..72], &[0u8; 8]);
    // Geometry fields round-trip.
    assert_eq!(
        u64::from_le_bytes(sector[72..80].try_into().unwrap()),
        disk.geometry().volume_length as u64
    );
    assert_eq!(
        u32::from_le_bytes(sector[80..84].try_into().unwrap()),
        disk.geometry().fat_offset
    );
    assert_eq!(
        u32::from_le_bytes(sector[100..104].try_into().unwrap()),
        0x1234_5678
    );
    assert_eq!(&sector[510..512], &[0x55, 0xAA]);
}

#[test]
fn backup_boot_region_mirrors_main() {
    let mut disk = new_disk(42);
    for lba in 0..12 {
        let main = read_sector(&mut disk, lba);
        let backup = read_sector(&mut disk, lba + 12);
        assert_eq!(main[..], backup[..], "backup mismatch at sector {lba}");
    }
}

#[test]
fn vbr_checksum_sector_recomputes() {
    let mut disk = new_disk(0xDEAD_BEEF);

    let checksum_sector = read_sector(&mut disk, 11);
    assert_eq!(checksum_sector[..], read_sector(&mut disk, 23)[..]);

    // The stored 32-bit value is replicated through the sector.
    let stored = u32::from_le_bytes(checksum_sector[0..4].try_into().unwrap());
    for chunk in checksum_sector.chunks_exact(4) {
        assert_eq!(u32::from_le_bytes(chunk.try_into().unwrap()), stored);
    }

    // Recompute with the published algorithm over sectors 0..=10.
    let mut sum: u32 = 0;
    for lba in 0..11 {
        let sector = read_sector(&mut disk, lba);
        for (off, &b) in sector.iter().enumerate() {
            if lba == 0 && (off == 106 || off == 107 || off == 112) {
                continue;
            }
            sum = sum.rotate_right(1).wrapping_add(b as u32);
        }
    }
    assert_eq!(sum, stored);
}

#[test]
fn extended_boot_sectors_carry_signature_only() {
    let mut disk = new_disk(1);
    for lba in [1, 8, 13, 20] {
        let sector = read_sector(&mut disk, lba);
        assert!(sector[..510].iter().all(|&b| b == 0), "sector {lba}");
        assert_eq!(&sector[510..], &[0x55, 0xAA]);
    }
    // OEM parameter sectors are all zero.
    for lba in [9, 10, 21, 22] {
        assert!(read_sector(&mut disk, lba).iter().all(|&b| b == 0));
    }
}

#[test]
fn fat0_first_bytes() {
    let mut disk = new_disk(1);
    let fat_lba = disk.geometry().fat_offset;
    let sector = read_sector(&mut disk, fat_lba);

    // FAT[0], FAT[1], then the bitmap chain starting 2 -> 3.
    assert_eq!(&sector[0..4], &[0xF8, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&sector[4..8], &[0xFF, 0xFF, 0xFF, 0xFF]);
    assert_eq!(&sector[8..12], &[0x03, 0x00, 0x00, 0x00]);

    // The rest of the FAT region reads as zero.
    assert!(read_sector(&mut disk, fat_lba + 1).iter().all(|&b| b == 0));
    let last_fat_lba = fat_lba + disk.geometry().fat_length - 1;
    assert!(read_sector(&mut disk, last_fat_lba)
        .iter()
        .all(|&b| b == 0));
}

#[test]
fn allocation_bitmap_is_all_used() {
    let mut disk = new_disk(1);
    let first = disk.geometry().bitmap_first_lba();
    let sectors = disk.geometry().bitmap_sectors();
    assert!(read_sector(&mut disk, first).iter().all(|&b| b == 0xFF));
    assert!(read_sector(&mut disk, first + sectors - 1)
        .iter()
        .all(|&b| b == 0xFF));
}

#[test]
fn root_directory_fixed_sector_with_empty_registry() {
    let mut disk = new_disk(1);
    let root_lba = disk.geometry().root_first_lba();
    let sector = read_sector(&mut disk, root_lba);

    // Volume label entry: type, length, "PicoVD" UTF-16, zero padded.
    assert_eq!(sector[0], 0x83);
    assert_eq!(sector[1], 6);
    let mut expected_label = [0u8; 22];
    for (i, u) in "PicoVD".encode_utf16().enumerate() {
        expected_label[2 * i..2 * i + 2].copy_from_slice(&u.to_le_bytes());
    }
    assert_eq!(&sector[2..24], &expected_label);

    // Allocation bitmap entry.
    assert_eq!(sector[32], 0x81);
    assert_eq!(sector[33], 0x00);
    assert_eq!(
        u32::from_le_bytes(sector[52..56].try_into().unwrap()),
        disk.geometry().bitmap_first_cluster
    );
    assert_eq!(
        u64::from_le_bytes(sector[56..64].try_into().unwrap()),
        disk.geometry().bitmap_data_length()
    );

    // Up-case table entry: checksum plus cluster and compressed length.
    assert_eq!(sector[64], 0x82);
    assert_eq!(
        u32::from_le_bytes(sector[84..88].try_into().unwrap()),
        disk.geometry().upcase_first_cluster
    );
    assert_eq!(u64::from_le_bytes(sector[88..96].try_into().unwrap()), 60);

    // Unused markers to the end, and in every slot sector.
    assert!(sector[96..].iter().all(|&b| b == 0x01));
    assert!(read_sector(&mut disk, root_lba + 1).iter().all(|&b| b == 0x01));
    let last = root_lba + disk.geometry().root_sectors() - 1;
    assert!(read_sector(&mut disk, last).iter().all(|&b| b == 0x01));
}

#[test]
fn upcase_region_serves_compressed_table() {
    let mut disk = new_disk(1);
    let lba = disk.geometry().upcase_first_lba();
    let sector = read_sector(&mut disk, lba);

    assert_eq!(&sector[0..4], &[0xFF, 0xFF, 0x61, 0x00]);
    assert_eq!(&sector[4..6], &[0x41, 0x00]); // 'A'
    assert_eq!(&sector[54..58], &[0x5A, 0x00, 0xFF, 0xFF]); // 'Z', run marker
    assert_eq!(&sector[58..60], &[0x85, 0xFF]); // run length 0xFF85
    assert!(sector[60..].iter().all(|&b| b == 0));
    assert!(read_sector(&mut disk, lba + 7).iter().all(|&b| b == 0));
}

fn counting_content() -> Arc<dyn FileContent> {
    Arc::new(|offset: u64, buf: &mut [u8]| {
        for (i, out) in buf.iter_mut().enumerate() {
            *out = (offset + i as u64) as u8;
        }
    })
}

#[test]
fn one_file_directory_set() {
    let mut disk = new_disk(1);
    let id = disk
        .add_file(FileSpec::new("README.TXT", 256), 256, counting_content())
        .unwrap();
    let first_cluster = disk.file_first_cluster(id).unwrap();
    assert_eq!(first_cluster, disk.geometry().dynamic_start_cluster);

    let slot_lba = disk.geometry().root_first_lba() + 1;
    let slot = read_sector(&mut disk, slot_lba);

    // Primary: 0x85, 2 secondaries, read-only attributes.
    assert_eq!(slot[0], 0x85);
    assert_eq!(slot[1], 2);
    assert_eq!(&slot[4..6], &[0x01, 0x00]);

    // Stream extension: contiguous, name length 10, sizes and cluster.
    assert_eq!(slot[32], 0xC0);
    assert_eq!(slot[33], 0x03);
    assert_eq!(slot[35], 10);
    assert_eq!(u64::from_le_bytes(slot[40..48].try_into().unwrap()), 256);
    assert_eq!(
        u32::from_le_bytes(slot[52..56].try_into().unwrap()),
        first_cluster
    );
    assert_eq!(u64::from_le_bytes(slot[56..64].try_into().unwrap()), 256);

    // Name hash over the (already upper-case) UTF-16 name.
    let mut hash: u16 = 0;
    for u in "README.TXT".encode_utf16() {
        for b in u.to_le_bytes() {
            hash = hash.rotate_right(1).wrapping_add(b as u16);
        }
    }
    assert_eq!(u16::from_le_bytes([slot[36], slot[37]]), hash);

    // Name entry: the UTF-16 name plus five zero fillers.
    assert_eq!(slot[64], 0xC1);
    let mut expected = [0u8; 30];
    for (i, u) in "README.TXT".encode_utf16().enumerate() {
        expected[2 * i..2 * i + 2].copy_from_slice(&u.to_le_bytes());
    }
    assert_eq!(&slot[66..96], &expected);

    // Set checksum is a fixed point of recomputation over the set.
    let stored = u16::from_le_bytes([slot[2], slot[3]]);
    let mut sum: u16 = 0;
    for (i, &b) in slot[..96].iter().enumerate() {
        if i == 2 || i == 3 {
            continue;
        }
        sum = sum.rotate_right(1).wrapping_add(b as u16);
    }
    assert_eq!(stored, sum);

    // Rest of the slot: unused markers; slots past the registry too.
    assert!(slot[96..].iter().all(|&b| b == 0x01));
    let beyond_lba = disk.geometry().root_first_lba() + 2;
    let beyond = read_sector(&mut disk, beyond_lba);
    assert!(beyond.iter().all(|&b| b == 0x01));
}

#[test]
fn file_content_dispatch_clamps_to_size() {
    let mut disk = new_disk(1);
    let id = disk
        .add_file(FileSpec::new("README.TXT", 256), 256, counting_content())
        .unwrap();
    let lba = disk
        .geometry()
        .cluster_to_lba(disk.file_first_cluster(id).unwrap());

    // First sector: 256 content bytes, zero tail.
    let sector = read_sector(&mut disk, lba);
    for (i, &b) in sector[..256].iter().enumerate() {
        assert_eq!(b, i as u8);
    }
    assert!(sector[256..].iter().all(|&b| b == 0));

    // Remaining sectors of the cluster: past end of file, all zero.
    for i in 1..8 {
        assert!(read_sector(&mut disk, lba + i).iter().all(|&b| b == 0));
    }

    // Unallocated dynamic space past the file reads as zero.
    assert!(read_sector(&mut disk, lba + 8).iter().all(|&b| b == 0));
}

#[test]
fn file_concatenation_matches_content() {
    let mut disk = new_disk(1);
    let size = 4096 + 100; // two clusters, partial tail
    let id = disk
        .add_file(FileSpec::new("DATA.BIN", size), size, counting_content())
        .unwrap();
    let base = disk
        .geometry()
        .cluster_to_lba(disk.file_first_cluster(id).unwrap());

    let mut out = Vec::new();
    for i in 0..16 {
        out.extend_from_slice(&read_sector(&mut disk, base + i));
    }
    for (i, &b) in out[..size as usize].iter().enumerate() {
        assert_eq!(b, i as u8, "content byte {i}");
    }
    assert!(out[size as usize..].iter().all(|&b| b == 0));
}

#[test]
fn chunked_reads_equal_full_sector_reads() {
    let mut disk = new_disk(7);
    let id = disk
        .add_file(FileSpec::new("README.TXT", 256), 256, counting_content())
        .unwrap();
    let g = *disk.geometry();
    let file_lba = g.cluster_to_lba(disk.file_first_cluster(id).unwrap());

    let interesting = [
        0,
        5,
        11,
        12,
        23,
        g.fat_offset,
        g.bitmap_first_lba(),
        g.upcase_first_lba(),
        g.root_first_lba(),
        g.root_first_lba() + 1,
        file_lba,
        g.volume_length - 1,
    ];
    for lba in interesting {
        let full = read_sector(&mut disk, lba);
        for chunk in [64, 128, 256] {
            assert_eq!(
                full[..],
                read_chunked(&mut disk, lba, chunk)[..],
                "lba {lba} chunk {chunk}"
            );
        }
    }
}

#[test]
fn unclaimed_lbas_read_zero() {
    let mut disk = new_disk(1);
    let end = disk.geometry().dynamic_end_lba();
    // Between the dynamic area and the first memory file there is nothing
    // registered: zeros.
    assert!(read_sector(&mut disk, end).iter().all(|&b| b == 0));
    let last = disk.geometry().volume_length - 1;
    assert!(read_sector(&mut disk, last).iter().all(|&b| b == 0));
}

#[test]
fn mem_file_serves_device_bytes() {
    static IMAGE: [u8; 0x8000] = [0x5A; 0x8000];

    let mut disk = new_disk(1);
    disk.add_mem_file(
        VolumeOptions::BOOTROM,
        0,
        Arc::new(vdfs::files::mem::SliceContent::new(&IMAGE)),
    )
    .unwrap();

    let g = *disk.geometry();
    let base = g.cluster_to_lba(VolumeOptions::BOOTROM.start_cluster);
    assert!(read_sector(&mut disk, base).iter().all(|&b| b == 0x5A));
    // Last sector of the file.
    let last = base + (0x8000 / 512) - 1;
    assert!(read_sector(&mut disk, last).iter().all(|&b| b == 0x5A));
    // One past the file: back to zeros.
    assert!(read_sector(&mut disk, last + 1).iter().all(|&b| b == 0));

    // The file shows up as the first root directory slot.
    let slot = read_sector(&mut disk, g.root_first_lba() + 1);
    assert_eq!(slot[0], 0x85);
    assert_eq!(
        u32::from_le_bytes(slot[52..56].try_into().unwrap()),
        VolumeOptions::BOOTROM.start_cluster
    );
}

#[test]
fn static_files_precede_dynamic_in_slots() {
    static IMAGE: [u8; 1024] = [1; 1024];

    let mut disk = new_disk(1);
    let id = disk
        .add_file(FileSpec::new("LOG.TXT", 10), 10, counting_content())
        .unwrap();
    disk.add_mem_file(
        VolumeOptions::SRAM,
        0,
        Arc::new(vdfs::files::mem::SliceContent::new(&IMAGE)),
    )
    .unwrap();
    let _ = id;

    let root = disk.geometry().root_first_lba();
    let slot0 = read_sector(&mut disk, root + 1);
    let slot1 = read_sector(&mut disk, root + 2);

    // Slot 0 is the fixed SRAM file even though it registered second.
    assert_eq!(
        u32::from_le_bytes(slot0[52..56].try_into().unwrap()),
        VolumeOptions::SRAM.start_cluster
    );
    assert_eq!(
        u32::from_le_bytes(slot1[52..56].try_into().unwrap()),
        disk.geometry().dynamic_start_cluster
    );
}

#[test]
fn update_grows_file_and_raises_notification() {
    let mut disk = new_disk(1);
    let id = disk
        .add_file(FileSpec::new("LOG.TXT", 0), 4096, counting_content())
        .unwrap();
    // Drain power-on state.
    let _ = disk.notifier().take_disallow_removal_failure();

    disk.update_file(id, 8192, 1000).unwrap();
    assert_eq!(disk.file_size(id), Some(8192));
    assert!(disk.notifier().unit_attention_pending());

    // The grown tail is served too.
    let base = disk
        .geometry()
        .cluster_to_lba(disk.file_first_cluster(id).unwrap());
    let sector = read_sector(&mut disk, base + 8);
    for (i, &b) in sector.iter().enumerate() {
        assert_eq!(b, (4096 + i) as u8);
    }
}
